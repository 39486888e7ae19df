//! Vehicle account integration
//!
//! The bridge talks to the vehicle only through [`VehicleClient`]. The
//! shipped implementation is [`RemoteVehicleClient`], which speaks JSON to a
//! telematics gateway.

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod remote;

pub use remote::RemoteVehicleClient;

/// Identity of the vehicle behind the account, fixed at login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleIdentity {
    /// Nickname given to the vehicle in the owner's account
    pub display_name: String,
    pub manufacturer: String,
    /// Model year and model name, e.g. "2019 LEAF"
    pub model_description: String,
    /// Vehicle identification number
    pub serial_number: String,
}

/// Battery status as reported by the vehicle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatteryStatus {
    /// State of charge, 0-100
    pub state_of_charge_percent: u8,
    pub is_charging: bool,
    /// When the vehicle captured this reading, if the gateway reports it
    #[serde(default)]
    pub captured_at: Option<DateTime<Utc>>,
}

impl BatteryStatus {
    pub const fn new(state_of_charge_percent: u8, is_charging: bool) -> Self {
        Self {
            state_of_charge_percent,
            is_charging,
            captured_at: None,
        }
    }
}

/// Result of a successful login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub identity: VehicleIdentity,
    pub status: BatteryStatus,
}

/// One-shot actions the vehicle can be asked to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VehicleCommand {
    StartClimate,
    StartCharging,
}

impl VehicleCommand {
    /// Short name used in log lines
    pub const fn label(self) -> &'static str {
        match self {
            Self::StartClimate => "climate",
            Self::StartCharging => "charging",
        }
    }
}

impl fmt::Display for VehicleCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Vehicle client trait
///
/// All methods may block on the network for as long as the implementation's
/// timeouts allow; callers run them off the accessory request path.
#[async_trait::async_trait]
pub trait VehicleClient: Send + Sync {
    /// Authenticate and return the vehicle identity with its current status
    async fn login(&self) -> Result<LoginOutcome>;

    /// Fetch the latest battery status
    async fn fetch_status(&self) -> Result<BatteryStatus>;

    /// Ask the vehicle to start charging
    async fn start_charging(&self) -> Result<()>;

    /// Ask the vehicle to start climate control
    async fn start_climate(&self) -> Result<()>;

    /// Dispatch a [`VehicleCommand`] to the matching method
    async fn send(&self, command: VehicleCommand) -> Result<()> {
        match command {
            VehicleCommand::StartClimate => self.start_climate().await,
            VehicleCommand::StartCharging => self.start_charging().await,
        }
    }
}
