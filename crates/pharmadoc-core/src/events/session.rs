//! Session lifecycle events.

use serde::{Deserialize, Serialize};

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoutReason {
    /// The user chose "log out now".
    UserRequested,
    /// Remaining session time reached zero.
    Expired,
}

impl std::fmt::Display for LogoutReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogoutReason::UserRequested => write!(f, "user_requested"),
            LogoutReason::Expired => write!(f, "expired"),
        }
    }
}

/// Events broadcast between session manager instances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// The user extended the session from the warning dialog.
    Extended,
    /// The session ended; listeners drop their state and go to `redirect_to`.
    Logout {
        /// Why the session ended.
        reason: LogoutReason,
        /// Route to navigate to.
        redirect_to: String,
    },
    /// A new token pair was stored.
    Refreshed,
    /// The expiry warning became visible.
    WarningShown {
        /// Seconds left when the warning appeared.
        remaining_seconds: u64,
    },
}

impl SessionEvent {
    /// The in-page event name this corresponds to.
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::Extended => "session:extended",
            SessionEvent::Logout { .. } => "auth:logout",
            SessionEvent::Refreshed => "session:refreshed",
            SessionEvent::WarningShown { .. } => "session:warning",
        }
    }
}
