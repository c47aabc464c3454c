//! Cross-instance session events.
//!
//! Independent session manager instances sharing one token store keep
//! each other loosely in sync through these events instead of polling
//! or sharing mutable state.

pub mod session;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use session::{LogoutReason, SessionEvent};

/// Wrapper for a session event with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique event ID.
    pub id: Uuid,
    /// The manager instance that emitted the event.
    pub origin: Uuid,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// The event payload.
    pub event: SessionEvent,
}

impl EventEnvelope {
    /// Create a new envelope stamped with `timestamp`.
    pub fn new(origin: Uuid, timestamp: DateTime<Utc>, event: SessionEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            origin,
            timestamp,
            event,
        }
    }
}
