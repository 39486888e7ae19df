use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use super::momentary::{MomentaryAction, RevertGuard};
use crate::accessory::Characteristic;
use crate::logging::StructuredLogger;
use crate::vehicle::{VehicleClient, VehicleCommand};

/// Handles writes and reads for one command switch
pub struct CommandHandler {
    command: VehicleCommand,
    client: Arc<dyn VehicleClient>,
    on: Arc<Characteristic<bool>>,
    revert_delay: Duration,
    logger: StructuredLogger,
}

impl CommandHandler {
    pub fn new(
        command: VehicleCommand,
        client: Arc<dyn VehicleClient>,
        on: Arc<Characteristic<bool>>,
        revert_delay: Duration,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            command,
            client,
            on,
            revert_delay,
            logger,
        }
    }

    pub const fn command(&self) -> VehicleCommand {
        self.command
    }

    /// The switch this handler drives
    pub const fn switch(&self) -> &Arc<Characteristic<bool>> {
        &self.on
    }

    /// Run a switch write to completion
    ///
    /// Writing `false` does nothing. Writing `true` sends the command and
    /// schedules the switch to turn off `revert_delay` after the send ends.
    /// Send failures are logged, never returned.
    pub async fn handle_write(&self, value: bool) -> MomentaryAction {
        let action = MomentaryAction::from_write(self.command, value);
        let MomentaryAction::Triggered(command) = action else {
            return action;
        };

        let _revert = RevertGuard::new(Arc::clone(&self.on), self.revert_delay);
        self.logger
            .info(&format!("Sending {} request...", command));
        match self.client.send(command).await {
            Ok(()) => self
                .logger
                .info(&format!("Successfully sent {} request", command)),
            Err(e) => self
                .logger
                .error(&format!("Unable to send {} request: {}", command, e)),
        }
        action
    }

    /// Reads always report the switch as off
    pub fn handle_read(&self) -> bool {
        self.logger
            .trace(&format!("{} switch read", self.command));
        MomentaryAction::Idle.as_switch_value()
    }

    /// Hand a remote write to a background task
    ///
    /// Returns `None` when no runtime is available; the switch is then
    /// turned off straight away.
    pub fn dispatch(self: &Arc<Self>, value: bool) -> Option<JoinHandle<MomentaryAction>> {
        match Handle::try_current() {
            Ok(rt) => {
                let handler = Arc::clone(self);
                Some(rt.spawn(async move { handler.handle_write(value).await }))
            }
            Err(_) => {
                self.logger.warn(&format!(
                    "No runtime available to send {} request",
                    self.command
                ));
                self.on.set_value(false);
                None
            }
        }
    }

    /// Wire the switch callbacks to this handler
    ///
    /// The callbacks hold weak references so the switch does not keep its
    /// handler alive.
    pub fn attach(self: &Arc<Self>) {
        let writer: Weak<Self> = Arc::downgrade(self);
        self.on.on_remote_update(move |value| {
            if let Some(handler) = writer.upgrade() {
                let _ = handler.dispatch(value);
            }
        });

        let reader: Weak<Self> = Arc::downgrade(self);
        self.on.on_remote_get(move || {
            reader
                .upgrade()
                .is_some_and(|handler| handler.handle_read())
        });
    }
}
