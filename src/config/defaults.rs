use super::*;

fn default_storage_path() -> PathBuf {
    std::env::var_os("HOME")
        .map_or_else(|| PathBuf::from("."), PathBuf::from)
        .join(".homecontrol")
        .join("leaf")
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            country: "US".to_string(),
        }
    }
}

impl Default for AccessoryConfig {
    fn default() -> Self {
        Self {
            name: None,
            pin: "00102003".to_string(),
            storage_path: default_storage_path(),
            host: "0.0.0.0".to_string(),
            port: 51826,
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_secs: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            file: None,
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            account: AccountConfig::default(),
            accessory: AccessoryConfig::default(),
            gateway: GatewayConfig::default(),
            logging: LoggingConfig::default(),
            update_interval_secs: 15 * 60,
            revert_delay_ms: 1000,
            debug: false,
        }
    }
}
