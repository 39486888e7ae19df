//! JSON gateway client for the vehicle account.
//!
//! Endpoints, relative to the configured base URL:
//!
//! - `POST /v1/session` exchanges credentials for a bearer token plus the
//!   vehicle record and its last known battery status
//! - `GET /v1/vehicles/{vin}/battery` returns the current battery status
//! - `POST /v1/vehicles/{vin}/actions/{charging-start|climate-start}`
//!
//! A 401/403 drops the cached session; the next call logs in again.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::{BatteryStatus, LoginOutcome, VehicleClient, VehicleCommand, VehicleIdentity};
use crate::config::Config;
use crate::error::{BridgeError, Result};
use crate::logging::{StructuredLogger, get_logger};

const DEFAULT_MANUFACTURER: &str = "Nissan";

/// Account credentials sent at login
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub country: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("country", &self.country)
            .finish()
    }
}

#[derive(Debug, Clone)]
struct Session {
    token: String,
    vin: String,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    token: String,
    vehicle: VehicleRecord,
    battery: BatteryRecord,
}

#[derive(Debug, Deserialize)]
struct VehicleRecord {
    #[serde(default)]
    nickname: String,
    #[serde(default)]
    manufacturer: Option<String>,
    #[serde(default)]
    model_year: String,
    #[serde(default)]
    model_name: String,
    vin: String,
}

#[derive(Debug, Deserialize)]
struct BatteryRecord {
    soc: u8,
    charging: bool,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl From<VehicleRecord> for VehicleIdentity {
    fn from(v: VehicleRecord) -> Self {
        let model_description = format!("{} {}", v.model_year, v.model_name)
            .trim()
            .to_string();
        let display_name = if v.nickname.trim().is_empty() {
            model_description.clone()
        } else {
            v.nickname
        };
        Self {
            display_name,
            manufacturer: v
                .manufacturer
                .unwrap_or_else(|| DEFAULT_MANUFACTURER.to_string()),
            model_description,
            serial_number: v.vin,
        }
    }
}

impl From<BatteryRecord> for BatteryStatus {
    fn from(b: BatteryRecord) -> Self {
        Self {
            state_of_charge_percent: b.soc,
            is_charging: b.charging,
            captured_at: b.updated_at,
        }
    }
}

/// Vehicle client backed by the JSON gateway
pub struct RemoteVehicleClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Credentials,
    session: RwLock<Option<Session>>,
    logger: StructuredLogger,
}

impl RemoteVehicleClient {
    /// Build a client with its own HTTP connection pool and request timeout
    pub fn new(base_url: &str, credentials: Credentials, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("leaf-bridge/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BridgeError::network(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(http, base_url, credentials))
    }

    /// Build a client around an existing `reqwest::Client`
    pub fn with_client(http: reqwest::Client, base_url: &str, credentials: Credentials) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            session: RwLock::new(None),
            logger: get_logger("gateway"),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let credentials = Credentials {
            username: config.account.username.clone(),
            password: config.account.password.clone(),
            country: config.account.country.clone(),
        };
        Self::new(
            &config.gateway.base_url,
            credentials,
            config.request_timeout(),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn open_session(&self) -> Result<SessionResponse> {
        self.logger.debug(&format!(
            "Logging in as {} (country {})",
            self.credentials.username, self.credentials.country
        ));
        let resp = self
            .http
            .post(self.url("/v1/session"))
            .json(&self.credentials)
            .send()
            .await?;
        let body: SessionResponse = self.check(resp).await?.json().await?;
        *self.session.write().await = Some(Session {
            token: body.token.clone(),
            vin: body.vehicle.vin.clone(),
        });
        Ok(body)
    }

    /// Cached session, logging in first when there is none
    async fn session(&self) -> Result<Session> {
        if let Some(s) = self.session.read().await.clone() {
            return Ok(s);
        }
        self.open_session().await?;
        self.session
            .read()
            .await
            .clone()
            .ok_or_else(|| BridgeError::auth("login did not establish a session"))
    }

    /// Map non-success statuses onto bridge errors
    async fn check(&self, resp: Response) -> Result<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        let snippet: String = body.chars().take(200).collect();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            *self.session.write().await = None;
            return Err(BridgeError::auth(format!(
                "gateway rejected credentials ({}): {}",
                status, snippet
            )));
        }
        Err(BridgeError::api(format!(
            "gateway returned {}: {}",
            status, snippet
        )))
    }

    async fn action(&self, command: VehicleCommand) -> Result<()> {
        let session = self.session().await?;
        let action = match command {
            VehicleCommand::StartCharging => "charging-start",
            VehicleCommand::StartClimate => "climate-start",
        };
        let resp = self
            .http
            .post(self.url(&format!(
                "/v1/vehicles/{}/actions/{}",
                session.vin, action
            )))
            .bearer_auth(&session.token)
            .send()
            .await?;
        self.check(resp).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl VehicleClient for RemoteVehicleClient {
    async fn login(&self) -> Result<LoginOutcome> {
        let body = self.open_session().await?;
        Ok(LoginOutcome {
            identity: body.vehicle.into(),
            status: body.battery.into(),
        })
    }

    async fn fetch_status(&self) -> Result<BatteryStatus> {
        let session = self.session().await?;
        let resp = self
            .http
            .get(self.url(&format!("/v1/vehicles/{}/battery", session.vin)))
            .bearer_auth(&session.token)
            .send()
            .await?;
        let record: BatteryRecord = self.check(resp).await?.json().await?;
        Ok(record.into())
    }

    async fn start_charging(&self) -> Result<()> {
        self.action(VehicleCommand::StartCharging).await
    }

    async fn start_climate(&self) -> Result<()> {
        self.action(VehicleCommand::StartClimate).await
    }
}
