//! Command line flags and `LEAF_*` environment variables.
//!
//! Every flag is optional; a flag that is present overrides the value loaded
//! from the YAML file.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use super::Config;
use crate::error::Result;

/// leaf-bridge -- expose an electric vehicle as a smart-home accessory
#[derive(Debug, Parser)]
#[command(
    name = "leaf-bridge",
    version = env!("APP_VERSION"),
    about = "Expose an electric vehicle as a smart-home accessory"
)]
pub struct Cli {
    /// YAML configuration file
    #[arg(long, env = "LEAF_CONFIG")]
    pub config: Option<PathBuf>,

    /// Vehicle account username
    #[arg(long, env = "LEAF_USERNAME")]
    pub username: Option<String>,

    /// Vehicle account password
    #[arg(long, env = "LEAF_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Vehicle account country
    #[arg(long, env = "LEAF_COUNTRY")]
    pub country: Option<String>,

    /// Accessory name (defaults to the vehicle nickname)
    #[arg(long, env = "LEAF_ACCESSORY_NAME")]
    pub accessory_name: Option<String>,

    /// Accessory pairing PIN
    #[arg(long = "homekit-pin", env = "LEAF_HOMEKIT_PIN")]
    pub pin: Option<String>,

    /// Storage path for accessory pairing data
    #[arg(long, env = "LEAF_STORAGE_PATH")]
    pub storage_path: Option<PathBuf>,

    /// How often to update battery status (e.g. 15m, 1h)
    #[arg(long, env = "LEAF_UPDATE_INTERVAL", value_parser = humantime::parse_duration)]
    pub update_interval: Option<Duration>,

    /// How long a momentary switch stays on before reverting (e.g. 1s)
    #[arg(long, env = "LEAF_REVERT_DELAY", value_parser = humantime::parse_duration)]
    pub revert_delay: Option<Duration>,

    /// Vehicle gateway base URL
    #[arg(long, env = "LEAF_GATEWAY_URL")]
    pub gateway_url: Option<String>,

    /// Vehicle gateway request timeout (e.g. 30s)
    #[arg(long, env = "LEAF_REQUEST_TIMEOUT", value_parser = humantime::parse_duration)]
    pub request_timeout: Option<Duration>,

    /// Accessory listener bind address
    #[arg(long, env = "LEAF_LISTEN_HOST")]
    pub host: Option<String>,

    /// Accessory listener port
    #[arg(long, env = "LEAF_PORT")]
    pub port: Option<u16>,

    /// Enable debug mode
    #[arg(long, env = "LEAF_DEBUG")]
    pub debug: bool,
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl Cli {
    /// Load the file layer and apply the flags on top of it
    pub fn into_config(self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;
        self.apply(&mut config);
        Ok(config)
    }

    /// Overlay the flags that were given onto `config`
    pub fn apply(self, config: &mut Config) {
        if let Some(v) = self.username {
            config.account.username = v;
        }
        if let Some(v) = self.password {
            config.account.password = v;
        }
        if let Some(v) = self.country {
            config.account.country = v;
        }
        if let Some(v) = self.accessory_name.filter(|n| !n.is_empty()) {
            config.accessory.name = Some(v);
        }
        if let Some(v) = self.pin {
            config.accessory.pin = v;
        }
        if let Some(v) = self.storage_path {
            config.accessory.storage_path = v;
        }
        if let Some(v) = self.host {
            config.accessory.host = v;
        }
        if let Some(v) = self.port {
            config.accessory.port = v;
        }
        if let Some(v) = self.update_interval {
            config.update_interval_secs = v.as_secs();
        }
        if let Some(v) = self.revert_delay {
            config.revert_delay_ms = millis(v);
        }
        if let Some(v) = self.gateway_url {
            config.gateway.base_url = v;
        }
        if let Some(v) = self.request_timeout {
            config.gateway.timeout_secs = v.as_secs();
        }
        if self.debug {
            config.debug = true;
            config.logging.level = "DEBUG".to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_file_values() {
        let mut config = Config::default();
        config.account.username = "from-file".to_string();

        let cli = Cli::try_parse_from([
            "leaf-bridge",
            "--username",
            "from-flag",
            "--update-interval",
            "5m",
            "--revert-delay",
            "1500ms",
            "--homekit-pin",
            "31415926",
            "--debug",
        ])
        .unwrap();
        cli.apply(&mut config);

        assert_eq!(config.account.username, "from-flag");
        assert_eq!(config.update_interval_secs, 300);
        assert_eq!(config.revert_delay_ms, 1500);
        assert_eq!(config.accessory.pin, "31415926");
        assert!(config.debug);
        assert_eq!(config.logging.level, "DEBUG");
    }

    #[test]
    fn absent_flags_keep_file_values() {
        let mut config = Config::default();
        config.account.country = "EU".to_string();
        config.accessory.port = 40000;

        let cli = Cli::try_parse_from(["leaf-bridge"]).unwrap();
        cli.apply(&mut config);

        assert_eq!(config.account.country, "EU");
        assert_eq!(config.accessory.port, 40000);
        assert!(config.accessory.name.is_none());
    }

    #[test]
    fn invalid_interval_is_rejected_by_parser() {
        let res = Cli::try_parse_from(["leaf-bridge", "--update-interval", "soon"]);
        assert!(res.is_err());
    }
}
