//! Structured logging and tracing for Leaf Bridge
//!
//! Console output is always available; a daily-rotated log file is added
//! when `logging.file` is configured. `RUST_LOG` overrides the configured
//! level when set.

use crate::config::LoggingConfig;
use crate::error::{BridgeError, Result};
use std::path::Path;
use tracing::{Level, info};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod level;
mod state;
mod structured;

pub use level::{effective_level, parse_log_level};
pub use structured::{LogContext, StructuredLogger, get_logger, get_logger_with_context};

use state::{INIT_ERROR, INIT_ONCE, LOG_GUARD};

type BoxedLayer = Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync>;

/// Initialize logging system based on configuration.
///
/// Only the first call installs a subscriber; later calls return the outcome
/// of that first attempt.
pub fn init_logging(config: &LoggingConfig, debug: bool) -> Result<()> {
    INIT_ONCE.call_once(|| {
        if let Err(e) = try_init(config, debug) {
            let _ = INIT_ERROR.set(e.to_string());
        }
    });

    if let Some(err) = INIT_ERROR.get() {
        return Err(BridgeError::config(err.clone()));
    }
    Ok(())
}

fn try_init(config: &LoggingConfig, debug: bool) -> Result<()> {
    let level = effective_level(&config.level, debug)?;
    let mut layers: Vec<BoxedLayer> = Vec::new();

    if config.console_output {
        layers.push(console_layer(config.json_format, level));
    }

    if let Some(dir) = config.file.as_deref() {
        layers.push(file_layer(config, dir, level)?);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(build_env_filter(level))
        .try_init()
        .map_err(|e| BridgeError::config(format!("Failed to install subscriber: {}", e)))?;

    info!(
        "Logging initialized - level: {:?}, file: {}",
        level,
        config.file.as_deref().unwrap_or("disabled")
    );
    Ok(())
}

fn build_env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "leaf_bridge={},tower_http={},reqwest=warn,hyper=warn",
            level, level
        )
        .into()
    })
}

fn console_layer(json_format: bool, level: Level) -> BoxedLayer {
    let base = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);
    if json_format {
        base.json()
            .with_filter(LevelFilter::from_level(level))
            .boxed()
    } else {
        base.with_filter(LevelFilter::from_level(level)).boxed()
    }
}

fn file_layer(config: &LoggingConfig, dir: &str, level: Level) -> Result<BoxedLayer> {
    // A path with an extension names a file; rotate next to it
    let p = Path::new(dir);
    let dir = if p.extension().is_some() {
        p.parent().unwrap_or(p)
    } else {
        p
    };

    let appender = rolling::Builder::new()
        .rotation(rolling::Rotation::DAILY)
        .filename_prefix("leaf-bridge")
        .filename_suffix("log")
        .max_log_files(config.backup_count.max(1) as usize)
        .build(dir)
        .map_err(|e| BridgeError::io(format!("Failed to create log file appender: {}", e)))?;

    let (writer, guard) = non_blocking(appender);
    let _ = LOG_GUARD.set(guard);

    let base = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);
    let layer = if config.json_format {
        base.json()
            .with_filter(LevelFilter::from_level(level))
            .boxed()
    } else {
        base.with_filter(LevelFilter::from_level(level)).boxed()
    };
    Ok(layer)
}
