//! Vehicle to accessory state bridge
//!
//! [`StateBridge`] owns the mapping between the vehicle and the accessory:
//! it renders battery readings onto the battery service, runs the periodic
//! refresh and drives the two momentary command switches.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::accessory::{BatteryService, Characteristic, ChargingState, VehicleAccessory};
use crate::error::Result;
use crate::logging::{StructuredLogger, get_logger};
use crate::vehicle::{BatteryStatus, VehicleClient, VehicleCommand};

pub mod commands;
pub mod momentary;
pub mod refresh;
pub mod render;

pub use commands::CommandHandler;
pub use momentary::{MomentaryAction, RevertGuard};
pub use refresh::{Ticker, run_refresh_loop};
pub use render::{BatteryRendering, LOW_BATTERY_THRESHOLD, render};

const MIN_REFRESH_PERIOD: Duration = Duration::from_secs(1);

/// Snapshot of everything the accessory currently reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccessoryState {
    pub battery_level: u8,
    pub low_battery: bool,
    pub charging_state: ChargingState,
    pub climate_on: bool,
    pub charge_on: bool,
}

pub struct StateBridge {
    client: Arc<dyn VehicleClient>,
    battery: BatteryService,
    climate: Arc<CommandHandler>,
    charge: Arc<CommandHandler>,
    render_lock: Mutex<()>,
    logger: StructuredLogger,
}

impl StateBridge {
    pub fn new(
        client: Arc<dyn VehicleClient>,
        vehicle: &VehicleAccessory,
        revert_delay: Duration,
    ) -> Self {
        let vin = vehicle.accessory.info().serial_number.value();
        let logger = get_logger("bridge").for_vehicle(&vin);
        let handler = |command: VehicleCommand, on: &Arc<Characteristic<bool>>| {
            Arc::new(CommandHandler::new(
                command,
                Arc::clone(&client),
                Arc::clone(on),
                revert_delay,
                logger.clone(),
            ))
        };
        let climate = handler(VehicleCommand::StartClimate, &vehicle.climate.on);
        let charge = handler(VehicleCommand::StartCharging, &vehicle.charge.on);
        Self {
            client,
            battery: vehicle.battery.clone(),
            climate,
            charge,
            render_lock: Mutex::new(()),
            logger,
        }
    }

    pub const fn logger(&self) -> &StructuredLogger {
        &self.logger
    }

    /// Handler for the given command's switch
    pub const fn command_handler(&self, command: VehicleCommand) -> &Arc<CommandHandler> {
        match command {
            VehicleCommand::StartClimate => &self.climate,
            VehicleCommand::StartCharging => &self.charge,
        }
    }

    /// Route remote switch writes and reads through the command handlers
    pub fn attach_switches(&self) {
        self.climate.attach();
        self.charge.attach();
    }

    /// Render a status reading onto the battery service
    pub fn apply_status(&self, status: &BatteryStatus) {
        let rendering = render(status);
        {
            let _render = self
                .render_lock
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            self.battery.battery_level.set_value(rendering.battery_level);
            self.battery
                .charging_state
                .set_value(rendering.charging_state);
            self.battery
                .status_low_battery
                .set_value(rendering.status_low_battery);
        }
        self.logger.info(&format!(
            "Battery Level: {}%  Charging: {}",
            status.state_of_charge_percent, status.is_charging
        ));
        if let Some(at) = status.captured_at {
            self.logger
                .debug(&format!("Battery reading captured at {}", at.to_rfc3339()));
        }
    }

    /// Fetch the latest status and render it
    ///
    /// On failure the accessory keeps its previous values.
    pub async fn refresh(&self) -> Result<()> {
        self.logger.info("Updating battery information");
        match self.client.fetch_status().await {
            Ok(status) => {
                self.apply_status(&status);
                Ok(())
            }
            Err(e) => {
                self.logger
                    .warn(&format!("Error updating battery info: {}", e));
                Err(e)
            }
        }
    }

    /// Current accessory values
    pub fn snapshot(&self) -> AccessoryState {
        let _render = self
            .render_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        AccessoryState {
            battery_level: self.battery.battery_level.value(),
            low_battery: self.battery.status_low_battery.value().is_low(),
            charging_state: self.battery.charging_state.value(),
            climate_on: self.climate.switch().value(),
            charge_on: self.charge.switch().value(),
        }
    }

    /// Start the refresh loop on its own task
    ///
    /// The first refresh happens one `period` from now.
    pub fn spawn_refresh_loop(
        self: &Arc<Self>,
        period: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let period = period.max(MIN_REFRESH_PERIOD);
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.logger.info(&format!(
            "Updating battery every {}",
            humantime::format_duration(period)
        ));
        tokio::spawn(run_refresh_loop(Arc::clone(self), interval, cancel))
    }
}
