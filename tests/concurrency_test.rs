mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{FakeVehicle, bridge_with};
use leaf_bridge::accessory::ChargingState;
use leaf_bridge::vehicle::BatteryStatus;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn refreshes_and_switch_writes_do_not_interfere() {
    for round in 0..20u8 {
        let vehicle = FakeVehicle::new(BatteryStatus::new(round, round % 2 == 0));
        let (bridge, accessory) = bridge_with(&vehicle, Duration::from_millis(5));

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let b = Arc::clone(&bridge);
            tasks.push(tokio::spawn(async move {
                let _ = b.refresh().await;
            }));
            let climate = Arc::clone(&accessory.climate.on);
            tasks.push(tokio::spawn(async move {
                climate.remote_write(true).unwrap();
            }));
            let charge = Arc::clone(&accessory.charge.on);
            tasks.push(tokio::spawn(async move {
                charge.remote_write(true).unwrap();
            }));
        }
        for t in tasks {
            t.await.unwrap();
        }

        // Every refresh saw the same reading, so the battery fields agree
        let state = bridge.snapshot();
        assert_eq!(state.battery_level, round);
        assert_eq!(state.low_battery, round <= 20);
        let expected = if round % 2 == 0 {
            ChargingState::Charging
        } else {
            ChargingState::NotCharging
        };
        assert_eq!(state.charging_state, expected);

        // All switch writes eventually revert
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let s = bridge.snapshot();
                if vehicle.command_count() == 16 && !s.climate_on && !s.charge_on {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
    }
}
