//! # Leaf Bridge - vehicle battery and remote commands as a smart-home accessory
//!
//! Exposes an electric vehicle's battery status and two one-shot remote
//! commands (start climate control, start charging) as an accessory with a
//! battery service and two momentary switches.
//!
//! ## Architecture
//!
//! - `vehicle`: vehicle account client trait and the JSON gateway client
//! - `accessory`: accessory, service and characteristic model plus pairing
//!   persistence
//! - `host`: HTTP transport serving the accessory
//! - `bridge`: rendering, periodic refresh and momentary command switches
//! - `app`: startup and ordered shutdown
//! - `config`: YAML configuration with command line and environment overrides
//! - `logging`: structured logging and tracing

pub mod accessory;
pub mod app;
pub mod bridge;
pub mod config;
pub mod error;
pub mod host;
pub mod logging;
pub mod vehicle;

// Re-export commonly used types
pub use app::{App, RunningApp};
pub use bridge::{AccessoryState, StateBridge};
pub use config::Config;
pub use error::{BridgeError, Result};
pub use vehicle::{BatteryStatus, VehicleClient};
