//! In-process broadcast of session events between manager instances.

use tokio::sync::broadcast;
use tracing::trace;

use pharmadoc_core::events::EventEnvelope;

const DEFAULT_CAPACITY: usize = 64;

/// Cloneable handle to a shared event channel. Every clone publishes to
/// and subscribes from the same channel.
#[derive(Debug, Clone)]
pub struct SessionBus {
    tx: broadcast::Sender<EventEnvelope>,
}

impl Default for SessionBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl SessionBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish to every current subscriber. Returns how many received it;
    /// having no subscribers is not an error.
    pub fn publish(&self, envelope: EventEnvelope) -> usize {
        let name = envelope.event.name();
        match self.tx.send(envelope) {
            Ok(receivers) => {
                trace!(event = name, receivers, "Session event published");
                receivers
            }
            Err(_) => 0,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pharmadoc_core::events::SessionEvent;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_publish_reaches_all_clones() {
        let bus = SessionBus::default();
        let other = bus.clone();
        let mut rx_a = bus.subscribe();
        let mut rx_b = other.subscribe();

        let origin = Uuid::new_v4();
        let sent = other.publish(EventEnvelope::new(origin, Utc::now(), SessionEvent::Extended));
        assert_eq!(sent, 2);

        assert_eq!(rx_a.recv().await.unwrap().origin, origin);
        assert_eq!(rx_b.recv().await.unwrap().event, SessionEvent::Extended);
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = SessionBus::new(4);
        let sent = bus.publish(EventEnvelope::new(
            Uuid::new_v4(),
            Utc::now(),
            SessionEvent::Refreshed,
        ));
        assert_eq!(sent, 0);
    }
}
