//! Accessory model
//!
//! The vehicle is exposed as a single accessory holding an information
//! service, a battery service and two switches. Instance ids are allocated
//! in insertion order, so the same build sequence always yields the same
//! ids and paired controllers keep their references across restarts.

use std::sync::Arc;

use serde_json::{Value, json};
use tokio::sync::broadcast;

use crate::logging::get_logger;

pub mod characteristic;
pub mod pairing;
pub mod service;
pub mod status;

pub use characteristic::{
    Characteristic, CharacteristicEvent, CharacteristicKind, CharacteristicValue,
    DynCharacteristic, Permission,
};
pub use pairing::{PairingState, PairingStore, PairingSummary, SetupPin};
pub use service::{
    AccessoryInformationService, BatteryService, ChargingState, Service, ServiceKind,
    StatusLowBattery, SwitchService,
};
pub use status::HapStatus;

const EVENT_CAPACITY: usize = 64;

/// Descriptive information for an accessory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessoryInfo {
    pub name: String,
    pub manufacturer: String,
    pub model: String,
    pub serial_number: String,
    pub firmware_revision: String,
}

/// Hands out instance ids and characteristics bound to one accessory
struct IidAllocator {
    aid: u64,
    next: u64,
    events: broadcast::Sender<CharacteristicEvent>,
}

impl IidAllocator {
    const fn next_iid(&mut self) -> u64 {
        let iid = self.next;
        self.next += 1;
        iid
    }

    fn characteristic<T: CharacteristicValue>(
        &mut self,
        kind: CharacteristicKind,
        initial: T,
    ) -> Arc<Characteristic<T>> {
        let iid = self.next_iid();
        Arc::new(Characteristic::new(
            self.aid,
            iid,
            kind,
            initial,
            self.events.clone(),
        ))
    }
}

/// An accessory and its service tree
pub struct Accessory {
    info: AccessoryInformationService,
    services: Vec<Service>,
    ids: IidAllocator,
}

impl Accessory {
    /// Create an accessory with its information service
    pub fn new(aid: u64, info: &AccessoryInfo) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let mut ids = IidAllocator {
            aid,
            next: 1,
            events,
        };

        let mut service = Service::new(ids.next_iid(), ServiceKind::AccessoryInformation, false);
        let handles = AccessoryInformationService {
            identify: ids.characteristic(CharacteristicKind::Identify, false),
            manufacturer: ids
                .characteristic(CharacteristicKind::Manufacturer, info.manufacturer.clone()),
            model: ids.characteristic(CharacteristicKind::Model, info.model.clone()),
            name: ids.characteristic(CharacteristicKind::Name, info.name.clone()),
            serial_number: ids
                .characteristic(CharacteristicKind::SerialNumber, info.serial_number.clone()),
            firmware_revision: ids.characteristic(
                CharacteristicKind::FirmwareRevision,
                info.firmware_revision.clone(),
            ),
        };
        service.push(&handles.identify);
        service.push(&handles.manufacturer);
        service.push(&handles.model);
        service.push(&handles.name);
        service.push(&handles.serial_number);
        service.push(&handles.firmware_revision);

        let logger = get_logger("accessory");
        let label = info.name.clone();
        handles.identify.on_remote_update(move |_| {
            logger.info(&format!("Identify requested for {}", label));
        });

        Self {
            info: handles,
            services: vec![service],
            ids,
        }
    }

    /// Attach a battery service
    pub fn add_battery_service(&mut self) -> BatteryService {
        let mut service = Service::new(self.ids.next_iid(), ServiceKind::Battery, true);
        let battery_level = self.ids.characteristic(CharacteristicKind::BatteryLevel, 0u8);
        let charging_state = self
            .ids
            .characteristic(CharacteristicKind::ChargingState, ChargingState::NotCharging);
        let status_low_battery = self.ids.characteristic(
            CharacteristicKind::StatusLowBattery,
            StatusLowBattery::Normal,
        );
        service.push(&battery_level);
        service.push(&charging_state);
        service.push(&status_low_battery);
        self.services.push(service);
        BatteryService {
            battery_level,
            charging_state,
            status_low_battery,
        }
    }

    /// Attach a named on/off switch
    pub fn add_switch_service(&mut self, name: &str) -> SwitchService {
        let mut service = Service::new(self.ids.next_iid(), ServiceKind::Switch, false);
        let on = self.ids.characteristic(CharacteristicKind::On, false);
        let name = self.ids.characteristic(CharacteristicKind::Name, name.to_string());
        service.push(&on);
        service.push(&name);
        self.services.push(service);
        SwitchService { name, on }
    }

    pub const fn aid(&self) -> u64 {
        self.ids.aid
    }

    pub const fn info(&self) -> &AccessoryInformationService {
        &self.info
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    /// Look up a characteristic by instance id
    pub fn find(&self, iid: u64) -> Option<&Arc<dyn DynCharacteristic>> {
        self.services
            .iter()
            .flat_map(|s| s.characteristics.iter())
            .find(|c| c.iid() == iid)
    }

    /// Subscribe to characteristic change events
    pub fn subscribe_events(&self) -> broadcast::Receiver<CharacteristicEvent> {
        self.ids.events.subscribe()
    }

    /// Database entry for this accessory
    pub fn describe(&self) -> Value {
        json!({
            "aid": self.ids.aid,
            "services": self.services.iter().map(Service::describe).collect::<Vec<_>>(),
        })
    }
}

/// Switch labels shown to the user
pub const CLIMATE_SWITCH_NAME: &str = "Climate Control";
pub const CHARGE_SWITCH_NAME: &str = "Charging";

/// The assembled vehicle accessory with typed handles to its services
#[derive(Clone)]
pub struct VehicleAccessory {
    pub accessory: Arc<Accessory>,
    pub battery: BatteryService,
    pub climate: SwitchService,
    pub charge: SwitchService,
}

impl VehicleAccessory {
    /// Build the accessory tree: information, battery, climate and charge
    pub fn new(info: &AccessoryInfo) -> Self {
        let mut accessory = Accessory::new(1, info);
        let battery = accessory.add_battery_service();
        let climate = accessory.add_switch_service(CLIMATE_SWITCH_NAME);
        let charge = accessory.add_switch_service(CHARGE_SWITCH_NAME);
        Self {
            accessory: Arc::new(accessory),
            battery,
            climate,
            charge,
        }
    }
}
