//! Session runner: the single tick source and input loop for a manager.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use pharmadoc_core::events::LogoutReason;

use crate::activity::{ActivityKind, Visibility};
use crate::manager::SessionManager;

/// Something the user or the host environment did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionInput {
    Activity(ActivityKind),
    Visibility(Visibility),
    /// "Extend session" in the warning dialog.
    Extend,
    /// "Log out now" in the warning dialog.
    Logout,
}

/// Drives a [`SessionManager`] until cancelled or the session ends.
#[derive(Debug)]
pub struct SessionRunner {
    manager: Arc<SessionManager>,
    inputs: mpsc::Receiver<SessionInput>,
}

impl SessionRunner {
    pub fn new(manager: Arc<SessionManager>, inputs: mpsc::Receiver<SessionInput>) -> Self {
        Self { manager, inputs }
    }

    /// Start the manager and loop over ticks, inputs, and bus events.
    ///
    /// Returns when `cancel` flips to `true` (or its sender goes away) or
    /// when the session reaches a terminal phase. The manager is always
    /// shut down on the way out.
    pub async fn run(mut self, mut cancel: watch::Receiver<bool>) {
        let mut events = self.manager.start().await;
        let mut ticker = time::interval(self.manager.config().tick_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut inputs_open = true;

        loop {
            tokio::select! {
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        info!("Session runner received shutdown signal");
                        break;
                    }
                }
                input = self.inputs.recv(), if inputs_open => {
                    match input {
                        Some(input) => self.handle_input(input).await,
                        None => {
                            debug!("Input channel closed; continuing on timers only");
                            inputs_open = false;
                        }
                    }
                }
                event = events.recv() => {
                    match event {
                        Ok(envelope) => self.manager.handle_event(&envelope).await,
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(skipped, "Session runner lagged behind session events");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
                _ = ticker.tick() => {
                    self.manager.tick().await;
                }
            }

            if self.manager.phase().await.is_terminal() {
                info!("Session ended; stopping runner");
                break;
            }
        }

        self.manager.shutdown().await;
    }

    async fn handle_input(&self, input: SessionInput) {
        match input {
            SessionInput::Activity(kind) => {
                self.manager.record_activity(kind).await;
            }
            SessionInput::Visibility(visibility) => {
                self.manager.on_visibility_change(visibility).await;
            }
            SessionInput::Extend => {
                if let Err(e) = self.manager.extend_session().await {
                    warn!(error = %e, "Could not extend session");
                }
            }
            SessionInput::Logout => {
                if let Err(e) = self.manager.logout(LogoutReason::UserRequested).await {
                    warn!(error = %e, "Logout did not fully clear storage");
                }
            }
        }
    }
}
