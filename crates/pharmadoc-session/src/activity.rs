//! Throttled user-activity tracking.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Interactions that count as the user being present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    PointerMove,
    Click,
    KeyPress,
    Scroll,
    Touch,
}

/// Whether the client is in the foreground.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Visible,
    Hidden,
}

/// Tracks the most recent qualifying activity, accepting at most one
/// activity event per throttle window.
#[derive(Debug, Clone)]
pub struct ActivityTracker {
    throttle: chrono::Duration,
    last_activity: DateTime<Utc>,
    /// When the last activity *event* was accepted; `touch` does not move it.
    last_accepted: Option<DateTime<Utc>>,
}

impl ActivityTracker {
    pub fn new(throttle: Duration, now: DateTime<Utc>) -> Self {
        Self {
            throttle: chrono::Duration::from_std(throttle).unwrap_or(chrono::Duration::MAX),
            last_activity: now,
            last_accepted: None,
        }
    }

    /// Record an activity event at `now`. Returns `false` when the event
    /// falls inside the throttle window of the previously accepted one.
    pub fn record(&mut self, now: DateTime<Utc>) -> bool {
        if let Some(previous) = self.last_accepted {
            if now - previous < self.throttle {
                return false;
            }
        }
        self.last_accepted = Some(now);
        self.last_activity = now;
        true
    }

    /// Mark the user active without consulting the throttle
    /// (visibility regained, tokens refreshed).
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity = now;
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    /// Time since the last activity, zero if `now` is earlier.
    pub fn idle_for(&self, now: DateTime<Utc>) -> Duration {
        (now - self.last_activity).to_std().unwrap_or(Duration::ZERO)
    }
}
