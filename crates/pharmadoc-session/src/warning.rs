//! Expiry-warning dialog state machine.
//!
//! ```text
//! Hidden ──show──▶ Visible ──hide (extend)──▶ Hidden
//!                     │
//!                     └──terminate (log out / zero)──▶ LoggedOut
//! ```
//!
//! The countdown is display state only. It is fed from the manager's
//! remaining-time computation and never decides anything itself.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DialogState {
    Hidden,
    Visible { countdown_seconds: u64 },
    LoggedOut,
}

#[derive(Debug, Clone)]
pub struct WarningDialog {
    state: DialogState,
    window_seconds: u64,
}

impl WarningDialog {
    pub fn new(window_seconds: u64) -> Self {
        Self {
            state: DialogState::Hidden,
            window_seconds,
        }
    }

    pub fn state(&self) -> DialogState {
        self.state
    }

    pub fn is_visible(&self) -> bool {
        matches!(self.state, DialogState::Visible { .. })
    }

    /// Seconds shown in the dialog. While hidden this is the full window,
    /// which is what the next warning starts from.
    pub fn countdown_seconds(&self) -> u64 {
        match self.state {
            DialogState::Visible { countdown_seconds } => countdown_seconds,
            DialogState::Hidden => self.window_seconds,
            DialogState::LoggedOut => 0,
        }
    }

    /// Hidden → Visible. Returns `true` only on that transition.
    pub fn show(&mut self, remaining_seconds: u64) -> bool {
        if self.state != DialogState::Hidden {
            return false;
        }
        self.state = DialogState::Visible {
            countdown_seconds: remaining_seconds.min(self.window_seconds),
        };
        true
    }

    /// Set the visible countdown; ignored unless visible.
    pub fn update_countdown(&mut self, remaining_seconds: u64) {
        if let DialogState::Visible { countdown_seconds } = &mut self.state {
            *countdown_seconds = remaining_seconds.min(self.window_seconds);
        }
    }

    /// Visible → Hidden. Returns `true` only on that transition.
    pub fn hide(&mut self) -> bool {
        if !self.is_visible() {
            return false;
        }
        self.state = DialogState::Hidden;
        true
    }

    /// Enter the terminal state from anywhere.
    pub fn terminate(&mut self) {
        self.state = DialogState::LoggedOut;
    }
}
