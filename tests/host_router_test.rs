mod common;

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{FakeVehicle, bridge_with};
use http_body_util::BodyExt;
use leaf_bridge::accessory::PairingSummary;
use leaf_bridge::host::{HostState, build_router};
use leaf_bridge::vehicle::BatteryStatus;
use serde_json::{Value, json};
use tower::ServiceExt;

fn pairing() -> PairingSummary {
    PairingSummary {
        device_id: "AA:BB:CC:DD:EE:FF".to_string(),
        config_number: 1,
        paired: false,
    }
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn put(body: &Value) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri("/characteristics")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn health_ok() {
    let vehicle = FakeVehicle::new(BatteryStatus::new(50, false));
    let (_bridge, accessory) = bridge_with(&vehicle, Duration::from_secs(1));
    let router = build_router(HostState {
        accessory: accessory.accessory,
        pairing: pairing(),
    });

    let resp = router.oneshot(get("/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn accessories_lists_battery_and_switches() {
    let vehicle = FakeVehicle::new(BatteryStatus::new(50, false));
    let (bridge, accessory) = bridge_with(&vehicle, Duration::from_secs(1));
    bridge.apply_status(&BatteryStatus::new(18, true));
    let router = build_router(HostState {
        accessory: accessory.accessory,
        pairing: pairing(),
    });

    let resp = router.oneshot(get("/accessories")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let db = body_json(resp).await;
    let services = db["accessories"][0]["services"].as_array().unwrap();
    let types: Vec<&str> = services
        .iter()
        .map(|s| s["type"].as_str().unwrap())
        .collect();
    assert_eq!(types, vec!["3E", "96", "49", "49"]);

    let battery = services[1]["characteristics"].as_array().unwrap();
    assert_eq!(battery[0]["value"], 18);
    assert_eq!(battery[1]["value"], 1);
    assert_eq!(battery[2]["value"], 1);
}

#[tokio::test]
async fn reads_go_through_remote_get() {
    let vehicle = FakeVehicle::new(BatteryStatus::new(50, false));
    let (bridge, accessory) = bridge_with(&vehicle, Duration::from_secs(1));
    bridge.apply_status(&BatteryStatus::new(64, false));
    accessory.climate.on.set_value(true);
    let level_iid = accessory.battery.battery_level.iid();
    let climate_iid = accessory.climate.on.iid();
    let router = build_router(HostState {
        accessory: accessory.accessory,
        pairing: pairing(),
    });

    let uri = format!("/characteristics?id=1.{},1.{}", level_iid, climate_iid);
    let resp = router.oneshot(get(&uri)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["characteristics"][0]["value"], 64);
    assert_eq!(body["characteristics"][1]["value"], false);
}

#[tokio::test]
async fn read_of_unknown_id_is_multi_status() {
    let vehicle = FakeVehicle::new(BatteryStatus::new(50, false));
    let (_bridge, accessory) = bridge_with(&vehicle, Duration::from_secs(1));
    let router = build_router(HostState {
        accessory: accessory.accessory,
        pairing: pairing(),
    });

    let resp = router
        .oneshot(get("/characteristics?id=1.9,1.999"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::MULTI_STATUS);
    let body = body_json(resp).await;
    assert!(body["characteristics"][0].get("status").is_none());
    assert_eq!(body["characteristics"][1]["status"], -70409);
}

#[tokio::test]
async fn malformed_read_ids_are_rejected() {
    let vehicle = FakeVehicle::new(BatteryStatus::new(50, false));
    let (_bridge, accessory) = bridge_with(&vehicle, Duration::from_secs(1));
    let router = build_router(HostState {
        accessory: accessory.accessory,
        pairing: pairing(),
    });

    let resp = router
        .oneshot(get("/characteristics?id=nine"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test(start_paused = true)]
async fn switch_write_triggers_command() {
    let vehicle = FakeVehicle::new(BatteryStatus::new(50, false));
    let (bridge, accessory) = bridge_with(&vehicle, Duration::from_secs(1));
    let climate_iid = accessory.climate.on.iid();
    let router = build_router(HostState {
        accessory: accessory.accessory.clone(),
        pairing: pairing(),
    });

    let body = json!({"characteristics": [{"aid": 1, "iid": climate_iid, "value": true}]});
    let resp = router.oneshot(put(&body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    tokio::time::sleep(Duration::from_millis(1001)).await;
    assert_eq!(vehicle.command_count(), 1);
    assert!(!bridge.snapshot().climate_on);
}

#[tokio::test]
async fn read_only_and_unknown_writes_are_rejected() {
    let vehicle = FakeVehicle::new(BatteryStatus::new(50, false));
    let (bridge, accessory) = bridge_with(&vehicle, Duration::from_secs(1));
    bridge.apply_status(&BatteryStatus::new(50, false));
    let level_iid = accessory.battery.battery_level.iid();
    let router = build_router(HostState {
        accessory: accessory.accessory.clone(),
        pairing: pairing(),
    });

    let body = json!({"characteristics": [
        {"aid": 1, "iid": level_iid, "value": 5},
        {"aid": 1, "iid": 999, "value": true},
    ]});
    let resp = router.oneshot(put(&body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::MULTI_STATUS);
    let result = body_json(resp).await;
    assert_eq!(result["characteristics"][0]["status"], -70404);
    assert_eq!(result["characteristics"][1]["status"], -70409);
    assert_eq!(bridge.snapshot().battery_level, 50);
}

#[tokio::test]
async fn pairing_summary_never_exposes_pin() {
    let vehicle = FakeVehicle::new(BatteryStatus::new(50, false));
    let (_bridge, accessory) = bridge_with(&vehicle, Duration::from_secs(1));
    let router = build_router(HostState {
        accessory: accessory.accessory,
        pairing: pairing(),
    });

    let resp = router.oneshot(get("/pairing")).await.unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["device_id"], "AA:BB:CC:DD:EE:FF");
    assert!(body.get("setup_pin").is_none());
}
