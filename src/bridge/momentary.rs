//! Momentary switch semantics
//!
//! A command switch only ever rests in the off position. Turning it on
//! triggers a one-shot vehicle command and the switch falls back to off a
//! short delay after the command finishes, whatever the outcome.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;

use crate::accessory::Characteristic;
use crate::vehicle::VehicleCommand;

/// What a switch write asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MomentaryAction {
    Idle,
    Triggered(VehicleCommand),
}

impl MomentaryAction {
    /// Interpret a boolean switch write for the given command
    pub const fn from_write(command: VehicleCommand, value: bool) -> Self {
        if value {
            Self::Triggered(command)
        } else {
            Self::Idle
        }
    }

    /// Boolean position shown on the switch
    pub const fn as_switch_value(self) -> bool {
        matches!(self, Self::Triggered(_))
    }
}

/// Turns a switch back off when dropped
///
/// The revert is scheduled `delay` after the drop on the current runtime.
/// Outside a runtime the switch is turned off immediately.
#[must_use = "the switch reverts as soon as the guard is dropped"]
pub struct RevertGuard {
    on: Arc<Characteristic<bool>>,
    delay: Duration,
}

impl RevertGuard {
    pub const fn new(on: Arc<Characteristic<bool>>, delay: Duration) -> Self {
        Self { on, delay }
    }
}

impl Drop for RevertGuard {
    fn drop(&mut self) {
        let on = Arc::clone(&self.on);
        match Handle::try_current() {
            Ok(handle) => {
                let delay = self.delay;
                handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    on.set_value(false);
                });
            }
            Err(_) => on.set_value(false),
        }
    }
}
