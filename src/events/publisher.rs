use serde_json::Value;
use tokio::sync::broadcast;

/// One lifecycle event (submission, state change, reconciliation finish)
/// fanned out to in-process subscribers.
#[derive(Debug, Clone)]
pub struct LifecycleEvent {
    pub name: String,
    pub context: Value,
    pub occurred_at: chrono::DateTime<chrono::Utc>,
}

/// Broadcast-backed publisher. Publishing is fire-and-forget: events are
/// observability signals, never control flow, so a missing subscriber is
/// not an error and a slow subscriber only loses its own backlog.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<LifecycleEvent>,
}

impl EventPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit one event. Event names come from [`crate::constants::events`];
    /// the context payload is free-form JSON.
    pub fn publish(&self, event_name: impl Into<String>, context: Value) {
        let event = LifecycleEvent {
            name: event_name.into(),
            context,
            occurred_at: chrono::Utc::now(),
        };
        // send() only fails when nobody is subscribed
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(crate::constants::defaults::EVENT_CHANNEL_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::events;
    use serde_json::json;

    #[tokio::test]
    async fn test_publish_reaches_subscriber() {
        let publisher = EventPublisher::new(16);
        let mut receiver = publisher.subscribe();

        publisher.publish(events::EXECUTION_COMPLETED, json!({ "execution_id": "e-1" }));

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.name, events::EXECUTION_COMPLETED);
        assert_eq!(event.context["execution_id"], "e-1");
    }

    #[test]
    fn test_publish_without_subscribers_is_noop() {
        let publisher = EventPublisher::new(16);
        publisher.publish(events::EXECUTION_SUBMITTED, json!({}));
        assert_eq!(publisher.subscriber_count(), 0);
    }
}
