//! Accessory transport
//!
//! [`AccessoryTransport`] is the seam between the accessory model and the
//! network. [`HttpAccessoryServer`] serves the accessory database and its
//! characteristics as JSON over HTTP using the accessory protocol's resource
//! layout, without the encrypted session layer.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::accessory::{Accessory, PairingSummary};
use crate::error::{BridgeError, Result};
use crate::logging::{StructuredLogger, get_logger};

pub mod routes;

pub use routes::{HostState, build_router};

/// Open event streams can hold graceful shutdown open; give up after this
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Network front end publishing an accessory
#[async_trait]
pub trait AccessoryTransport: Send {
    /// Start serving; returns the bound address
    async fn start(&mut self) -> Result<SocketAddr>;

    /// Stop accepting requests and wait for the server to wind down
    async fn stop(&mut self) -> Result<()>;
}

/// axum server exposing the accessory over HTTP
pub struct HttpAccessoryServer {
    state: HostState,
    host: String,
    port: u16,
    shutdown: CancellationToken,
    task: Option<JoinHandle<std::io::Result<()>>>,
    logger: StructuredLogger,
}

impl HttpAccessoryServer {
    pub fn new(accessory: Arc<Accessory>, pairing: PairingSummary, host: &str, port: u16) -> Self {
        Self {
            state: HostState { accessory, pairing },
            host: host.to_string(),
            port,
            shutdown: CancellationToken::new(),
            task: None,
            logger: get_logger("host"),
        }
    }

    fn bind_addr(&self) -> SocketAddr {
        match self.host.parse::<IpAddr>() {
            Ok(ip) => SocketAddr::new(ip, self.port),
            Err(_) => {
                self.logger.warn(&format!(
                    "Invalid host '{}'; falling back to 127.0.0.1",
                    self.host
                ));
                SocketAddr::from(([127, 0, 0, 1], self.port))
            }
        }
    }
}

#[async_trait]
impl AccessoryTransport for HttpAccessoryServer {
    async fn start(&mut self) -> Result<SocketAddr> {
        if self.task.is_some() {
            return Err(BridgeError::transport("accessory server already started"));
        }

        let addr = self.bind_addr();
        self.logger
            .info(&format!("Binding accessory server to {}", addr));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| BridgeError::transport(format!("failed to bind {}: {}", addr, e)))?;
        let local_addr = listener.local_addr()?;

        let router = build_router(self.state.clone());
        let token = self.shutdown.clone();
        self.task = Some(tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(token.cancelled_owned())
                .await
        }));

        self.logger.info(&format!(
            "Accessory server listening at http://{} (device id {})",
            local_addr, self.state.pairing.device_id
        ));
        Ok(local_addr)
    }

    async fn stop(&mut self) -> Result<()> {
        self.shutdown.cancel();
        let Some(mut task) = self.task.take() else {
            return Ok(());
        };

        match tokio::time::timeout(SHUTDOWN_GRACE, &mut task).await {
            Ok(Ok(Ok(()))) => {
                self.logger.info("Accessory server stopped");
                Ok(())
            }
            Ok(Ok(Err(e))) => Err(BridgeError::transport(format!(
                "accessory server failed: {}",
                e
            ))),
            Ok(Err(e)) => Err(BridgeError::transport(format!(
                "accessory server task failed: {}",
                e
            ))),
            Err(_) => {
                self.logger
                    .warn("Accessory server did not drain in time; aborting open connections");
                task.abort();
                Ok(())
            }
        }
    }
}
