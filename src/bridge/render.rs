use crate::accessory::{ChargingState, StatusLowBattery};
use crate::vehicle::BatteryStatus;

/// At or below this state of charge the battery is reported as low
pub const LOW_BATTERY_THRESHOLD: u8 = 20;

/// Battery characteristic values derived from one status reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryRendering {
    pub battery_level: u8,
    pub status_low_battery: StatusLowBattery,
    pub charging_state: ChargingState,
}

/// Map a status reading onto battery characteristic values
pub const fn render(status: &BatteryStatus) -> BatteryRendering {
    let soc = status.state_of_charge_percent;
    BatteryRendering {
        battery_level: soc,
        status_low_battery: if soc <= LOW_BATTERY_THRESHOLD {
            StatusLowBattery::Low
        } else {
            StatusLowBattery::Normal
        },
        charging_state: if status.is_charging {
            ChargingState::Charging
        } else {
            ChargingState::NotCharging
        },
    }
}
