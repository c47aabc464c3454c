//! Named periodic timers driven by a single tick source.
//!
//! The scheduler never sleeps or spawns anything. The owner calls
//! [`Scheduler::due`] with the current time on every tick and runs
//! whatever fired.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Timers a session runs. Due timers fire in this declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerName {
    /// Refresh the token pair regardless of activity.
    ProactiveRefresh,
    /// Compare idle time against the inactivity threshold.
    InactivityCheck,
    /// Recompute remaining session time; show the warning or expire.
    ExpiryCheck,
    /// Update the warning countdown. Only scheduled while the warning shows.
    Countdown,
}

impl fmt::Display for TimerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerName::ProactiveRefresh => write!(f, "proactive_refresh"),
            TimerName::InactivityCheck => write!(f, "inactivity_check"),
            TimerName::ExpiryCheck => write!(f, "expiry_check"),
            TimerName::Countdown => write!(f, "countdown"),
        }
    }
}

#[derive(Debug, Clone)]
struct Timer {
    every: chrono::Duration,
    next_due: DateTime<Utc>,
}

/// Set of independently cancellable periodic timers.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    timers: BTreeMap<TimerName, Timer>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// (Re)schedule `name` to fire every `every`, first at `now + every`.
    /// A deadline past the representable range never fires.
    pub fn schedule(&mut self, name: TimerName, every: Duration, now: DateTime<Utc>) {
        let every = chrono::Duration::from_std(every)
            .unwrap_or(chrono::Duration::MAX)
            .max(chrono::Duration::milliseconds(1));
        self.timers.insert(
            name,
            Timer {
                every,
                next_due: saturating_add(now, every),
            },
        );
    }

    /// Cancel one timer. Returns whether it was scheduled.
    pub fn cancel(&mut self, name: TimerName) -> bool {
        self.timers.remove(&name).is_some()
    }

    /// Cancel every timer, returning how many were scheduled.
    pub fn cancel_all(&mut self) -> usize {
        let count = self.timers.len();
        self.timers.clear();
        count
    }

    pub fn next_due(&self, name: TimerName) -> Option<DateTime<Utc>> {
        self.timers.get(&name).map(|t| t.next_due)
    }

    pub fn scheduled(&self) -> Vec<TimerName> {
        self.timers.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Timers whose deadline has passed at `now`.
    ///
    /// Each timer fires at most once per call however many periods were
    /// missed; its next deadline moves to the first period boundary after
    /// `now`.
    pub fn due(&mut self, now: DateTime<Utc>) -> Vec<TimerName> {
        let mut fired = Vec::new();

        for (name, timer) in self.timers.iter_mut() {
            if timer.next_due > now {
                continue;
            }

            let every_ms = timer.every.num_milliseconds().max(1);
            let behind_ms = (now - timer.next_due).num_milliseconds();
            let periods = behind_ms / every_ms + 1;
            timer.next_due = chrono::Duration::try_milliseconds(every_ms.saturating_mul(periods))
                .map_or(DateTime::<Utc>::MAX_UTC, |step| {
                    saturating_add(timer.next_due, step)
                });

            fired.push(*name);
        }

        fired
    }
}

fn saturating_add(at: DateTime<Utc>, by: chrono::Duration) -> DateTime<Utc> {
    at.checked_add_signed(by).unwrap_or(DateTime::<Utc>::MAX_UTC)
}
