//! Configuration management for Leaf Bridge
//!
//! Configuration is layered: built-in defaults, then an optional YAML file,
//! then command line flags and `LEAF_*` environment variables (see [`cli`]).

use crate::accessory::pairing::SetupPin;
use crate::error::{BridgeError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub mod cli;
mod defaults;

pub use cli::Cli;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Vehicle account credentials and region
    pub account: AccountConfig,

    /// Accessory identity, pairing and listener settings
    pub accessory: AccessoryConfig,

    /// Vehicle gateway connection settings
    pub gateway: GatewayConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// How often to refresh battery status, in seconds
    pub update_interval_secs: u64,

    /// Delay before a momentary switch reverts to off, in milliseconds
    pub revert_delay_ms: u64,

    /// Enable debug logging
    pub debug: bool,
}

/// Vehicle account credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    /// Account username
    pub username: String,

    /// Account password
    #[serde(skip_serializing)]
    pub password: String,

    /// Account country/region code (e.g. US, EU, JP)
    pub country: String,
}

/// Accessory settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessoryConfig {
    /// Display name override; the vehicle nickname is used when unset
    pub name: Option<String>,

    /// Eight digit setup PIN
    pub pin: String,

    /// Directory for persisted pairing data
    pub storage_path: PathBuf,

    /// Listener bind address
    pub host: String,

    /// Listener TCP port
    pub port: u16,
}

/// Vehicle gateway connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Base URL of the telematics gateway
    pub base_url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Optional log directory; file logging is disabled when unset
    pub file: Option<String>,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from an explicit path or the default locations,
    /// falling back to built-in defaults when no file exists
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        let default_paths = ["leaf_bridge.yaml", "/etc/leaf-bridge/config.yaml"];
        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        Ok(Self::default())
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Refresh interval as a `Duration`
    pub const fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_secs)
    }

    /// Momentary switch revert delay as a `Duration`
    pub const fn revert_delay(&self) -> Duration {
        Duration::from_millis(self.revert_delay_ms)
    }

    /// Gateway request timeout as a `Duration`
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.gateway.timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.account.username.trim().is_empty() || self.account.password.is_empty() {
            return Err(BridgeError::config("username and password required"));
        }

        if self.account.country.trim().is_empty() {
            return Err(BridgeError::validation(
                "account.country",
                "Country cannot be empty",
            ));
        }

        SetupPin::parse(&self.accessory.pin)?;

        if self.accessory.port == 0 {
            return Err(BridgeError::validation(
                "accessory.port",
                "Port must be greater than 0",
            ));
        }

        if self.update_interval_secs == 0 {
            return Err(BridgeError::validation(
                "update_interval_secs",
                "Must be greater than 0",
            ));
        }

        if self.gateway.base_url.trim().is_empty() {
            return Err(BridgeError::validation(
                "gateway.base_url",
                "Gateway URL cannot be empty",
            ));
        }

        if self.gateway.timeout_secs == 0 {
            return Err(BridgeError::validation(
                "gateway.timeout_secs",
                "Must be greater than 0",
            ));
        }

        Ok(())
    }
}
