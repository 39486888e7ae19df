//! Pairing identity persistence
//!
//! Keeps the accessory device id, setup PIN and configuration number in
//! `pairing.json` under the storage path so the accessory keeps the same
//! identity across restarts.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};
use crate::logging::{StructuredLogger, get_logger};

const PAIRING_FILE: &str = "pairing.json";

const TRIVIAL_PINS: &[&str] = &[
    "00000000", "11111111", "22222222", "33333333", "44444444", "55555555", "66666666",
    "77777777", "88888888", "99999999", "12345678", "87654321",
];

/// Eight-digit accessory setup code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupPin(String);

impl SetupPin {
    /// Accepts `00102003` or `001-02-003`
    pub fn parse(input: &str) -> Result<Self> {
        let digits: String = input.chars().filter(|c| *c != '-').collect();
        if digits.len() != 8 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(BridgeError::validation(
                "accessory.pin",
                "setup PIN must be exactly 8 digits",
            ));
        }
        if TRIVIAL_PINS.contains(&digits.as_str()) {
            return Err(BridgeError::validation(
                "accessory.pin",
                format!("setup PIN {} is too easy to guess", digits),
            ));
        }
        Ok(Self(digits))
    }

    pub fn digits(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SetupPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", &self.0[..3], &self.0[3..5], &self.0[5..])
    }
}

/// Persisted pairing record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingState {
    /// Accessory identifier in `AA:BB:CC:DD:EE:FF` form
    pub device_id: String,
    pub setup_pin: String,
    /// Bumped whenever the advertised accessory changes
    pub config_number: u32,
    #[serde(default)]
    pub paired_controllers: Vec<String>,
}

impl PairingState {
    fn fresh(pin: &SetupPin) -> Self {
        Self {
            device_id: generate_device_id(),
            setup_pin: pin.digits().to_string(),
            config_number: 1,
            paired_controllers: Vec::new(),
        }
    }
}

/// Public view of the pairing record; never includes the PIN
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairingSummary {
    pub device_id: String,
    pub config_number: u32,
    pub paired: bool,
}

fn generate_device_id() -> String {
    let bytes = uuid::Uuid::new_v4().into_bytes();
    bytes[..6]
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}

/// Loads and saves the pairing record
pub struct PairingStore {
    path: PathBuf,
    state: PairingState,
    logger: StructuredLogger,
}

impl PairingStore {
    /// Load the record under `storage_path`, creating it on first run
    pub fn load_or_create(storage_path: &Path, pin: &SetupPin) -> Result<Self> {
        let logger = get_logger("pairing");
        std::fs::create_dir_all(storage_path).map_err(|e| {
            BridgeError::io(format!(
                "cannot create storage path {}: {}",
                storage_path.display(),
                e
            ))
        })?;
        let path = storage_path.join(PAIRING_FILE);

        if !path.exists() {
            let store = Self {
                path,
                state: PairingState::fresh(pin),
                logger,
            };
            store.save()?;
            store.logger.info(&format!(
                "Created pairing state with device id {}",
                store.state.device_id
            ));
            return Ok(store);
        }

        let contents = std::fs::read_to_string(&path)?;
        let state: PairingState = serde_json::from_str(&contents)?;
        let mut store = Self {
            path,
            state,
            logger,
        };
        store
            .logger
            .info(&format!("Loaded pairing state from {}", store.path.display()));

        if store.state.setup_pin != pin.digits() {
            store.state.setup_pin = pin.digits().to_string();
            store.state.config_number = store.state.config_number.wrapping_add(1).max(1);
            store.save()?;
            store.logger.info("Setup PIN changed, configuration number bumped");
        }
        Ok(store)
    }

    /// Write the record to disk
    pub fn save(&self) -> Result<()> {
        let contents = serde_json::to_string_pretty(&self.state)?;
        std::fs::write(&self.path, contents)?;
        self.logger.debug("Saved pairing state to disk");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub const fn state(&self) -> &PairingState {
        &self.state
    }

    pub fn device_id(&self) -> &str {
        &self.state.device_id
    }

    pub const fn config_number(&self) -> u32 {
        self.state.config_number
    }

    pub fn summary(&self) -> PairingSummary {
        PairingSummary {
            device_id: self.state.device_id.clone(),
            config_number: self.state.config_number,
            paired: !self.state.paired_controllers.is_empty(),
        }
    }
}
