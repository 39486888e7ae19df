use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use leaf_bridge::app::{self, App};
use leaf_bridge::config::Cli;
use leaf_bridge::logging::{get_logger, init_logging};
use leaf_bridge::vehicle::{RemoteVehicleClient, VehicleClient};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Cli::parse()
        .into_config()
        .context("Failed to load configuration")?;

    init_logging(&config.logging, config.debug)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;
    let logger = get_logger("main");
    logger.info(&format!("Leaf Bridge {} starting up", app::APP_VERSION));

    config.validate().context("Invalid configuration")?;

    let client: Arc<dyn VehicleClient> = Arc::new(
        RemoteVehicleClient::from_config(&config).context("Failed to create vehicle client")?,
    );
    let running = App::start(&config, client)
        .await
        .context("Failed to start bridge")?;

    app::shutdown_signal().await;
    running.shutdown().await.context("Shutdown failed")?;
    logger.info("Shutdown complete");
    Ok(())
}
