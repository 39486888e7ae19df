use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio_stream::{StreamExt, wrappers::BroadcastStream};
use tower_http::trace::TraceLayer;

use crate::accessory::{Accessory, HapStatus, PairingSummary};

#[derive(Clone)]
pub struct HostState {
    pub accessory: Arc<Accessory>,
    pub pairing: PairingSummary,
}

#[derive(Debug, Deserialize)]
pub struct ReadParams {
    /// Comma separated `aid.iid` pairs
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct WriteRequest {
    pub characteristics: Vec<WriteItem>,
}

#[derive(Debug, Deserialize)]
pub struct WriteItem {
    pub aid: u64,
    pub iid: u64,
    pub value: Value,
}

#[derive(Debug, Serialize)]
struct ItemResult {
    aid: u64,
    iid: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<HapStatus>,
}

/// Parse `1.9,1.13` into `(aid, iid)` pairs
pub fn parse_ids(raw: &str) -> Option<Vec<(u64, u64)>> {
    raw.split(',')
        .map(|pair| {
            let (aid, iid) = pair.trim().split_once('.')?;
            Some((aid.parse().ok()?, iid.parse().ok()?))
        })
        .collect()
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn accessories(State(state): State<HostState>) -> impl IntoResponse {
    Json(json!({ "accessories": [state.accessory.describe()] }))
}

async fn pairing(State(state): State<HostState>) -> impl IntoResponse {
    Json(state.pairing)
}

async fn read_characteristics(
    State(state): State<HostState>,
    Query(params): Query<ReadParams>,
) -> Response {
    let Some(ids) = parse_ids(&params.id) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "expected id=aid.iid[,aid.iid...]"})),
        )
            .into_response();
    };

    let mut failed = false;
    let results: Vec<ItemResult> = ids
        .into_iter()
        .map(|(aid, iid)| {
            let read = if aid == state.accessory.aid() {
                state
                    .accessory
                    .find(iid)
                    .ok_or(HapStatus::NotFound)
                    .and_then(|c| c.read_json())
            } else {
                Err(HapStatus::NotFound)
            };
            match read {
                Ok(value) => ItemResult {
                    aid,
                    iid,
                    value: Some(value),
                    status: None,
                },
                Err(status) => {
                    failed = true;
                    ItemResult {
                        aid,
                        iid,
                        value: None,
                        status: Some(status),
                    }
                }
            }
        })
        .collect();

    let code = if failed {
        StatusCode::MULTI_STATUS
    } else {
        StatusCode::OK
    };
    (code, Json(json!({ "characteristics": results }))).into_response()
}

async fn write_characteristics(
    State(state): State<HostState>,
    Json(body): Json<WriteRequest>,
) -> Response {
    let mut failed = false;
    let results: Vec<ItemResult> = body
        .characteristics
        .into_iter()
        .map(|item| {
            let write = if item.aid == state.accessory.aid() {
                state
                    .accessory
                    .find(item.iid)
                    .ok_or(HapStatus::NotFound)
                    .and_then(|c| c.write_json(&item.value))
            } else {
                Err(HapStatus::NotFound)
            };
            let status = match write {
                Ok(()) => HapStatus::Success,
                Err(status) => {
                    failed = true;
                    status
                }
            };
            ItemResult {
                aid: item.aid,
                iid: item.iid,
                value: None,
                status: Some(status),
            }
        })
        .collect();

    if failed {
        (
            StatusCode::MULTI_STATUS,
            Json(json!({ "characteristics": results })),
        )
            .into_response()
    } else {
        StatusCode::NO_CONTENT.into_response()
    }
}

async fn events(State(state): State<HostState>) -> impl IntoResponse {
    let rx = state.accessory.subscribe_events();
    let stream = BroadcastStream::new(rx).filter_map(|msg| match msg {
        Ok(change) => Event::default()
            .event("characteristic")
            .json_data(&change)
            .ok()
            .map(Ok::<Event, Infallible>),
        Err(_) => None,
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

pub fn build_router(state: HostState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/accessories", get(accessories))
        .route(
            "/characteristics",
            get(read_characteristics).put(write_characteristics),
        )
        .route("/events", get(events))
        .route("/pairing", get(pairing))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ids_accepts_lists() {
        assert_eq!(parse_ids("1.9,1.13"), Some(vec![(1, 9), (1, 13)]));
        assert_eq!(parse_ids(" 1.2 "), Some(vec![(1, 2)]));
    }

    #[test]
    fn parse_ids_rejects_garbage() {
        assert_eq!(parse_ids("1"), None);
        assert_eq!(parse_ids("1.x"), None);
        assert_eq!(parse_ids("1.2,"), None);
    }
}
