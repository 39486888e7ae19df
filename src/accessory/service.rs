use std::sync::Arc;

use serde_json::{Value, json};

use super::characteristic::{Characteristic, CharacteristicValue, DynCharacteristic};

/// Service types used by the vehicle accessory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    AccessoryInformation,
    Switch,
    Battery,
}

impl ServiceKind {
    pub const fn type_id(self) -> &'static str {
        match self {
            Self::AccessoryInformation => "3E",
            Self::Switch => "49",
            Self::Battery => "96",
        }
    }
}

/// Charging state reported by a battery service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargingState {
    NotCharging,
    Charging,
    NotChargeable,
}

impl CharacteristicValue for ChargingState {
    const FORMAT: &'static str = "uint8";

    fn to_json(&self) -> Value {
        let code: u8 = match self {
            Self::NotCharging => 0,
            Self::Charging => 1,
            Self::NotChargeable => 2,
        };
        json!(code)
    }

    fn from_json(value: &Value) -> Option<Self> {
        match value.as_u64()? {
            0 => Some(Self::NotCharging),
            1 => Some(Self::Charging),
            2 => Some(Self::NotChargeable),
            _ => None,
        }
    }

    fn bounds() -> Option<(u64, u64)> {
        Some((0, 2))
    }
}

/// Low battery indicator reported by a battery service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusLowBattery {
    Normal,
    Low,
}

impl StatusLowBattery {
    pub const fn is_low(self) -> bool {
        matches!(self, Self::Low)
    }
}

impl CharacteristicValue for StatusLowBattery {
    const FORMAT: &'static str = "uint8";

    fn to_json(&self) -> Value {
        json!(u8::from(self.is_low()))
    }

    fn from_json(value: &Value) -> Option<Self> {
        match value.as_u64()? {
            0 => Some(Self::Normal),
            1 => Some(Self::Low),
            _ => None,
        }
    }

    fn bounds() -> Option<(u64, u64)> {
        Some((0, 1))
    }
}

/// A service as it appears in the accessory database
pub struct Service {
    pub(crate) iid: u64,
    pub(crate) kind: ServiceKind,
    pub(crate) primary: bool,
    pub(crate) characteristics: Vec<Arc<dyn DynCharacteristic>>,
}

impl Service {
    pub(crate) const fn new(iid: u64, kind: ServiceKind, primary: bool) -> Self {
        Self {
            iid,
            kind,
            primary,
            characteristics: Vec::new(),
        }
    }

    pub(crate) fn push<T: CharacteristicValue>(&mut self, c: &Arc<Characteristic<T>>) {
        self.characteristics
            .push(Arc::clone(c) as Arc<dyn DynCharacteristic>);
    }

    pub const fn iid(&self) -> u64 {
        self.iid
    }

    pub const fn kind(&self) -> ServiceKind {
        self.kind
    }

    pub fn characteristics(&self) -> &[Arc<dyn DynCharacteristic>] {
        &self.characteristics
    }

    pub fn describe(&self) -> Value {
        json!({
            "iid": self.iid,
            "type": self.kind.type_id(),
            "primary": self.primary,
            "characteristics": self
                .characteristics
                .iter()
                .map(|c| c.describe())
                .collect::<Vec<_>>(),
        })
    }
}

/// Typed handles to the accessory information characteristics
#[derive(Debug, Clone)]
pub struct AccessoryInformationService {
    pub identify: Arc<Characteristic<bool>>,
    pub manufacturer: Arc<Characteristic<String>>,
    pub model: Arc<Characteristic<String>>,
    pub name: Arc<Characteristic<String>>,
    pub serial_number: Arc<Characteristic<String>>,
    pub firmware_revision: Arc<Characteristic<String>>,
}

/// Typed handles to a battery service
#[derive(Debug, Clone)]
pub struct BatteryService {
    pub battery_level: Arc<Characteristic<u8>>,
    pub charging_state: Arc<Characteristic<ChargingState>>,
    pub status_low_battery: Arc<Characteristic<StatusLowBattery>>,
}

/// Typed handles to a named on/off switch
#[derive(Debug, Clone)]
pub struct SwitchService {
    pub name: Arc<Characteristic<String>>,
    pub on: Arc<Characteristic<bool>>,
}
