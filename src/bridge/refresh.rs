//! Periodic battery refresh

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::Interval;
use tokio_util::sync::CancellationToken;

use super::StateBridge;

/// Source of refresh ticks
#[async_trait]
pub trait Ticker: Send {
    /// Wait for the next tick; `None` means no more ticks will come
    async fn tick(&mut self) -> Option<()>;
}

#[async_trait]
impl Ticker for Interval {
    async fn tick(&mut self) -> Option<()> {
        Interval::tick(self).await;
        Some(())
    }
}

#[async_trait]
impl Ticker for mpsc::Receiver<()> {
    async fn tick(&mut self) -> Option<()> {
        self.recv().await
    }
}

/// Refresh the bridge on every tick until cancelled
///
/// Cancellation is checked before waiting for a tick and again once a tick
/// arrives, so a tick delivered after cancellation never triggers a fetch.
/// A fetch in flight is abandoned when cancellation fires.
pub async fn run_refresh_loop<T: Ticker>(
    bridge: Arc<StateBridge>,
    mut ticker: T,
    cancel: CancellationToken,
) {
    let logger = bridge.logger().clone();
    logger.info("Entering battery update loop");
    loop {
        if cancel.is_cancelled() {
            break;
        }
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            tick = ticker.tick() => {
                if tick.is_none() || cancel.is_cancelled() {
                    break;
                }
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    _ = bridge.refresh() => {}
                }
            }
        }
    }
    logger.info("Exited battery update loop");
}
