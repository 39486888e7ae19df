//! Application wiring and lifecycle
//!
//! Startup order: pairing store, vehicle login, accessory tree, initial
//! render, switch callbacks, refresh loop, transport. Shutdown runs the
//! other way: cancel the loop, stop the transport, then wait for the loop.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::accessory::{AccessoryInfo, PairingStore, SetupPin, VehicleAccessory};
use crate::bridge::StateBridge;
use crate::config::Config;
use crate::error::Result;
use crate::host::{AccessoryTransport, HttpAccessoryServer};
use crate::logging::{StructuredLogger, get_logger};
use crate::vehicle::{LoginOutcome, VehicleClient};

/// Firmware revision reported by the accessory
pub const APP_VERSION: &str = env!("APP_VERSION");

/// Builds and starts the bridge
pub struct App;

impl App {
    /// Log in, build the accessory and start serving it
    ///
    /// Login and transport failures are returned; nothing is left running
    /// when this fails.
    pub async fn start(config: &Config, client: Arc<dyn VehicleClient>) -> Result<RunningApp> {
        let logger = get_logger("app");

        let pin = SetupPin::parse(&config.accessory.pin)?;
        let pairing = PairingStore::load_or_create(&config.accessory.storage_path, &pin)?;

        logger.info("Connecting to vehicle account");
        let LoginOutcome { identity, status } = client.login().await?;
        logger.info(&format!(
            "Found {}, VIN {}",
            identity.model_description, identity.serial_number
        ));

        let name = config
            .accessory
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(identity.display_name);
        let vehicle = VehicleAccessory::new(&AccessoryInfo {
            name,
            manufacturer: identity.manufacturer,
            model: identity.model_description,
            serial_number: identity.serial_number,
            firmware_revision: APP_VERSION.to_string(),
        });

        let bridge = Arc::new(StateBridge::new(client, &vehicle, config.revert_delay()));
        bridge.apply_status(&status);
        bridge.attach_switches();

        let cancel = CancellationToken::new();
        let refresh = bridge.spawn_refresh_loop(config.update_interval(), cancel.clone());

        logger.info("Starting transport...");
        let mut server = HttpAccessoryServer::new(
            Arc::clone(&vehicle.accessory),
            pairing.summary(),
            &config.accessory.host,
            config.accessory.port,
        );
        let local_addr = match server.start().await {
            Ok(addr) => addr,
            Err(e) => {
                cancel.cancel();
                let _ = refresh.await;
                return Err(e);
            }
        };
        logger.info(&format!("Pair using setup code {}", pin));

        Ok(RunningApp {
            bridge,
            vehicle,
            server,
            cancel,
            refresh,
            local_addr,
            logger,
        })
    }
}

/// A started bridge
pub struct RunningApp {
    bridge: Arc<StateBridge>,
    vehicle: VehicleAccessory,
    server: HttpAccessoryServer,
    cancel: CancellationToken,
    refresh: JoinHandle<()>,
    local_addr: SocketAddr,
    logger: StructuredLogger,
}

impl RunningApp {
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub const fn bridge(&self) -> &Arc<StateBridge> {
        &self.bridge
    }

    pub const fn vehicle(&self) -> &VehicleAccessory {
        &self.vehicle
    }

    /// Stop the refresh loop and the transport
    pub async fn shutdown(mut self) -> Result<()> {
        self.logger.info("Shutting down");
        self.cancel.cancel();
        let stopped = self.server.stop().await;
        if let Err(e) = self.refresh.await {
            self.logger
                .warn(&format!("Battery update loop ended abnormally: {}", e));
        }
        stopped
    }
}

/// Resolves on Ctrl-C or, on unix, SIGTERM
pub async fn shutdown_signal() {
    let logger = get_logger("app");

    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            logger.warn(&format!("Cannot listen for Ctrl-C: {}", e));
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                logger.warn(&format!("Cannot listen for SIGTERM: {}", e));
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
