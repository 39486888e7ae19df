//! Typed characteristic cells.
//!
//! A [`Characteristic`] owns one value. Local writes come from the bridge;
//! remote reads and writes come from the transport and go through the
//! optional callback slots, mirroring how accessory protocols let the
//! application intercept controller access.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;
use serde_json::{Value, json};
use tokio::sync::{broadcast, watch};

use super::status::HapStatus;

/// Characteristic types used by the vehicle accessory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharacteristicKind {
    Identify,
    Manufacturer,
    Model,
    Name,
    SerialNumber,
    FirmwareRevision,
    On,
    BatteryLevel,
    ChargingState,
    StatusLowBattery,
}

impl CharacteristicKind {
    /// Short-form type UUID
    pub const fn type_id(self) -> &'static str {
        match self {
            Self::Identify => "14",
            Self::Manufacturer => "20",
            Self::Model => "21",
            Self::Name => "23",
            Self::On => "25",
            Self::SerialNumber => "30",
            Self::FirmwareRevision => "52",
            Self::BatteryLevel => "68",
            Self::StatusLowBattery => "79",
            Self::ChargingState => "8F",
        }
    }

    pub const fn permissions(self) -> &'static [Permission] {
        match self {
            Self::Identify => &[Permission::Write],
            Self::Manufacturer
            | Self::Model
            | Self::Name
            | Self::SerialNumber
            | Self::FirmwareRevision => &[Permission::Read],
            Self::On => &[Permission::Read, Permission::Write, Permission::Notify],
            Self::BatteryLevel | Self::ChargingState | Self::StatusLowBattery => {
                &[Permission::Read, Permission::Notify]
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Permission {
    #[serde(rename = "pr")]
    Read,
    #[serde(rename = "pw")]
    Write,
    #[serde(rename = "ev")]
    Notify,
}

/// Values that can live in a characteristic
pub trait CharacteristicValue: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// Wire format name
    const FORMAT: &'static str;

    fn to_json(&self) -> Value;

    fn from_json(value: &Value) -> Option<Self>;

    /// Inclusive numeric bounds advertised to controllers
    fn bounds() -> Option<(u64, u64)> {
        None
    }
}

impl CharacteristicValue for bool {
    const FORMAT: &'static str = "bool";

    fn to_json(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            // Controllers may send 0/1 for booleans
            Value::Number(n) => match n.as_u64() {
                Some(0) => Some(false),
                Some(1) => Some(true),
                _ => None,
            },
            _ => None,
        }
    }
}

impl CharacteristicValue for u8 {
    const FORMAT: &'static str = "uint8";

    fn to_json(&self) -> Value {
        json!(self)
    }

    fn from_json(value: &Value) -> Option<Self> {
        value.as_u64().and_then(|v| Self::try_from(v).ok())
    }

    fn bounds() -> Option<(u64, u64)> {
        Some((0, 100))
    }
}

impl CharacteristicValue for String {
    const FORMAT: &'static str = "string";

    fn to_json(&self) -> Value {
        Value::String(self.clone())
    }

    fn from_json(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

/// Change notification published on the accessory event bus
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CharacteristicEvent {
    pub aid: u64,
    pub iid: u64,
    pub value: Value,
}

pub type RemoteUpdateFn<T> = Arc<dyn Fn(T) + Send + Sync>;
pub type RemoteGetFn<T> = Arc<dyn Fn() -> T + Send + Sync>;

/// A single typed, observable attribute of a service
pub struct Characteristic<T: CharacteristicValue> {
    aid: u64,
    iid: u64,
    kind: CharacteristicKind,
    value: watch::Sender<T>,
    events: broadcast::Sender<CharacteristicEvent>,
    on_remote_update: RwLock<Option<RemoteUpdateFn<T>>>,
    on_remote_get: RwLock<Option<RemoteGetFn<T>>>,
}

impl<T: CharacteristicValue> fmt::Debug for Characteristic<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Characteristic")
            .field("aid", &self.aid)
            .field("iid", &self.iid)
            .field("kind", &self.kind)
            .field("value", &*self.value.borrow())
            .finish_non_exhaustive()
    }
}

impl<T: CharacteristicValue> Characteristic<T> {
    pub(crate) fn new(
        aid: u64,
        iid: u64,
        kind: CharacteristicKind,
        initial: T,
        events: broadcast::Sender<CharacteristicEvent>,
    ) -> Self {
        let (value, _) = watch::channel(initial);
        Self {
            aid,
            iid,
            kind,
            value,
            events,
            on_remote_update: RwLock::new(None),
            on_remote_get: RwLock::new(None),
        }
    }

    pub const fn iid(&self) -> u64 {
        self.iid
    }

    pub const fn kind(&self) -> CharacteristicKind {
        self.kind
    }

    /// Current stored value
    pub fn value(&self) -> T {
        self.value.borrow().clone()
    }

    /// Store a value; subscribers are notified only when it changes
    pub fn set_value(&self, new: T) {
        let changed = self.value.send_if_modified(|current| {
            if *current == new {
                return false;
            }
            *current = new.clone();
            true
        });
        if changed {
            let _ = self.events.send(CharacteristicEvent {
                aid: self.aid,
                iid: self.iid,
                value: new.to_json(),
            });
        }
    }

    /// Watch this value for changes
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.value.subscribe()
    }

    /// Register the callback run after a controller writes a value
    pub fn on_remote_update<F>(&self, f: F)
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        *self
            .on_remote_update
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(f));
    }

    /// Register the callback that answers controller reads
    pub fn on_remote_get<F>(&self, f: F)
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        *self
            .on_remote_get
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(f));
    }

    /// Value reported to a controller
    pub fn remote_value(&self) -> T {
        let getter = self
            .on_remote_get
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        getter.map_or_else(|| self.value(), |get| get())
    }

    /// Apply a controller write: store the value, then run the update callback
    pub fn remote_write(&self, new: T) -> Result<(), HapStatus> {
        if !self.kind.permissions().contains(&Permission::Write) {
            return Err(HapStatus::ReadOnly);
        }
        self.set_value(new.clone());
        let callback = self
            .on_remote_update
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(callback) = callback {
            callback(new);
        }
        Ok(())
    }
}

/// Type-erased view used by the transport
pub trait DynCharacteristic: Send + Sync {
    fn iid(&self) -> u64;

    fn kind(&self) -> CharacteristicKind;

    /// Value for a controller read, as JSON
    fn read_json(&self) -> Result<Value, HapStatus>;

    /// Controller write from JSON
    fn write_json(&self, value: &Value) -> Result<(), HapStatus>;

    /// Entry for the accessory database
    fn describe(&self) -> Value;
}

impl<T: CharacteristicValue> DynCharacteristic for Characteristic<T> {
    fn iid(&self) -> u64 {
        self.iid
    }

    fn kind(&self) -> CharacteristicKind {
        self.kind
    }

    fn read_json(&self) -> Result<Value, HapStatus> {
        if !self.kind.permissions().contains(&Permission::Read) {
            return Err(HapStatus::WriteOnly);
        }
        Ok(self.remote_value().to_json())
    }

    fn write_json(&self, value: &Value) -> Result<(), HapStatus> {
        let parsed = T::from_json(value).ok_or(HapStatus::InvalidValue)?;
        if let Some((min, max)) = T::bounds() {
            let n = value.as_u64().ok_or(HapStatus::InvalidValue)?;
            if n < min || n > max {
                return Err(HapStatus::InvalidValue);
            }
        }
        self.remote_write(parsed)
    }

    fn describe(&self) -> Value {
        let perms = self.kind.permissions();
        let mut entry = json!({
            "iid": self.iid,
            "type": self.kind.type_id(),
            "format": T::FORMAT,
            "perms": perms,
        });
        if perms.contains(&Permission::Read) {
            entry["value"] = self.remote_value().to_json();
        }
        if let Some((min, max)) = T::bounds() {
            entry["minValue"] = json!(min);
            entry["maxValue"] = json!(max);
            entry["minStep"] = json!(1);
        }
        entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn on_switch() -> Characteristic<bool> {
        let (events, _) = broadcast::channel(16);
        Characteristic::new(1, 10, CharacteristicKind::On, false, events)
    }

    #[test]
    fn set_value_notifies_only_on_change() {
        let (events, mut rx) = broadcast::channel(16);
        let level = Characteristic::new(1, 9, CharacteristicKind::BatteryLevel, 0u8, events);

        level.set_value(42);
        level.set_value(42);

        let event = rx.try_recv().unwrap();
        assert_eq!(event.iid, 9);
        assert_eq!(event.value, json!(42));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn remote_write_stores_then_calls_back() {
        let on = Arc::new(on_switch());
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let probe = Arc::clone(&on);
        on.on_remote_update(move |v| {
            assert!(v);
            assert!(probe.value());
            seen.fetch_add(1, Ordering::SeqCst);
        });

        on.remote_write(true).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn remote_get_overrides_stored_value() {
        let on = on_switch();
        on.set_value(true);
        assert!(on.remote_value());

        on.on_remote_get(|| false);
        assert!(!on.remote_value());
        assert!(on.value());
    }

    #[test]
    fn read_only_rejects_writes() {
        let (events, _) = broadcast::channel(16);
        let level = Characteristic::new(1, 9, CharacteristicKind::BatteryLevel, 50u8, events);
        assert_eq!(level.write_json(&json!(10)), Err(HapStatus::ReadOnly));
        assert_eq!(level.value(), 50);
    }

    #[test]
    fn write_json_validates_values() {
        let on = on_switch();
        assert_eq!(on.write_json(&json!("yes")), Err(HapStatus::InvalidValue));
        assert_eq!(on.write_json(&json!(1)), Ok(()));
        assert!(on.value());
    }

    #[test]
    fn describe_includes_bounds_for_levels() {
        let (events, _) = broadcast::channel(16);
        let level = Characteristic::new(1, 9, CharacteristicKind::BatteryLevel, 77u8, events);
        let d = level.describe();
        assert_eq!(d["type"], "68");
        assert_eq!(d["format"], "uint8");
        assert_eq!(d["value"], 77);
        assert_eq!(d["maxValue"], 100);
        assert_eq!(d["perms"], json!(["pr", "ev"]));
    }
}
