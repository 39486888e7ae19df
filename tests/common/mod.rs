#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use leaf_bridge::accessory::{AccessoryInfo, VehicleAccessory};
use leaf_bridge::bridge::StateBridge;
use leaf_bridge::error::{BridgeError, Result};
use leaf_bridge::vehicle::{BatteryStatus, LoginOutcome, VehicleClient, VehicleIdentity};

/// Scriptable in-memory vehicle
pub struct FakeVehicle {
    status: Mutex<std::result::Result<BatteryStatus, String>>,
    pub fail_login: AtomicBool,
    pub fail_commands: AtomicBool,
    pub command_delay: Mutex<Duration>,
    pub logins: AtomicUsize,
    pub fetches: AtomicUsize,
    pub climate_calls: AtomicUsize,
    pub charging_calls: AtomicUsize,
}

impl FakeVehicle {
    pub fn new(status: BatteryStatus) -> Arc<Self> {
        Arc::new(Self {
            status: Mutex::new(Ok(status)),
            fail_login: AtomicBool::new(false),
            fail_commands: AtomicBool::new(false),
            command_delay: Mutex::new(Duration::ZERO),
            logins: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
            climate_calls: AtomicUsize::new(0),
            charging_calls: AtomicUsize::new(0),
        })
    }

    pub fn set_status(&self, status: BatteryStatus) {
        *self.status.lock().unwrap() = Ok(status);
    }

    pub fn fail_fetches(&self, message: &str) {
        *self.status.lock().unwrap() = Err(message.to_string());
    }

    pub fn set_command_delay(&self, delay: Duration) {
        *self.command_delay.lock().unwrap() = delay;
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn command_count(&self) -> usize {
        self.climate_calls.load(Ordering::SeqCst) + self.charging_calls.load(Ordering::SeqCst)
    }

    pub fn identity() -> VehicleIdentity {
        VehicleIdentity {
            display_name: "Sparky".to_string(),
            manufacturer: "Nissan".to_string(),
            model_description: "2019 LEAF".to_string(),
            serial_number: "SJNFAAZE0U6000001".to_string(),
        }
    }

    async fn command(&self, counter: &AtomicUsize) -> Result<()> {
        counter.fetch_add(1, Ordering::SeqCst);
        let delay = *self.command_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_commands.load(Ordering::SeqCst) {
            Err(BridgeError::network("vehicle did not respond"))
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl VehicleClient for FakeVehicle {
    async fn login(&self) -> Result<LoginOutcome> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        if self.fail_login.load(Ordering::SeqCst) {
            return Err(BridgeError::auth("invalid credentials"));
        }
        let status = self
            .status
            .lock()
            .unwrap()
            .clone()
            .unwrap_or(BatteryStatus::new(50, false));
        Ok(LoginOutcome {
            identity: Self::identity(),
            status,
        })
    }

    async fn fetch_status(&self) -> Result<BatteryStatus> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let next = self.status.lock().unwrap().clone();
        next.map_err(BridgeError::network)
    }

    async fn start_charging(&self) -> Result<()> {
        self.command(&self.charging_calls).await
    }

    async fn start_climate(&self) -> Result<()> {
        self.command(&self.climate_calls).await
    }
}

pub fn accessory_info() -> AccessoryInfo {
    let id = FakeVehicle::identity();
    AccessoryInfo {
        name: id.display_name,
        manufacturer: id.manufacturer,
        model: id.model_description,
        serial_number: id.serial_number,
        firmware_revision: "0.3.0".to_string(),
    }
}

/// Bridge wired to a fake vehicle with switch callbacks attached
pub fn bridge_with(
    vehicle: &Arc<FakeVehicle>,
    revert_delay: Duration,
) -> (Arc<StateBridge>, VehicleAccessory) {
    let accessory = VehicleAccessory::new(&accessory_info());
    let client: Arc<dyn VehicleClient> = Arc::clone(vehicle) as Arc<dyn VehicleClient>;
    let bridge = Arc::new(StateBridge::new(client, &accessory, revert_delay));
    bridge.attach_switches();
    (bridge, accessory)
}
