//! Event publishers for queue notifications

use crate::error::Result;
use crate::types::QueueEvent;
use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, info};

/// Default number of events a slow broadcast subscriber may lag behind
pub const DEFAULT_EVENT_BUFFER: usize = 256;

/// Trait for publishing queue events
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a single event
    async fn publish(&self, event: QueueEvent) -> Result<()>;
}

/// Fans events out to in-process subscribers over a tokio broadcast channel
#[derive(Debug, Clone)]
pub struct BroadcastEventPublisher {
    sender: broadcast::Sender<QueueEvent>,
}

impl BroadcastEventPublisher {
    pub fn new(buffer: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer.max(1));
        Self { sender }
    }

    /// Subscribe to every event published from now on
    pub fn subscribe(&self) -> BroadcastStream<QueueEvent> {
        BroadcastStream::new(self.sender.subscribe())
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastEventPublisher {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER)
    }
}

#[async_trait]
impl EventPublisher for BroadcastEventPublisher {
    async fn publish(&self, event: QueueEvent) -> Result<()> {
        let event_type = event.event_type();
        match self.sender.send(event) {
            Ok(receivers) => debug!("Broadcast {} to {} subscribers", event_type, receivers),
            // No subscribers is a normal state, not a failure
            Err(_) => debug!("Dropped {} event, no subscribers", event_type),
        }
        Ok(())
    }
}

/// Writes every event to the log as structured JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct LogEventPublisher;

#[async_trait]
impl EventPublisher for LogEventPublisher {
    async fn publish(&self, event: QueueEvent) -> Result<()> {
        let payload = serde_json::to_string(&event)?;
        info!(
            event_type = event.event_type(),
            queue = event.queue(),
            %payload,
            "Queue event"
        );
        Ok(())
    }
}

/// Keeps published events in memory for inspection
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingEventPublisher {
    published_events: std::sync::Mutex<Vec<QueueEvent>>,
}

#[cfg(test)]
impl RecordingEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all published events
    pub fn get_published_events(&self) -> Vec<QueueEvent> {
        self.published_events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Count events of a specific type
    pub fn count_events_of_type(&self, event_type: &str) -> usize {
        self.get_published_events()
            .iter()
            .filter(|event| event.event_type() == event_type)
            .count()
    }

    pub fn clear_events(&self) {
        if let Ok(mut events) = self.published_events.lock() {
            events.clear();
        }
    }
}

#[cfg(test)]
#[async_trait]
impl EventPublisher for RecordingEventPublisher {
    async fn publish(&self, event: QueueEvent) -> Result<()> {
        if let Ok(mut events) = self.published_events.lock() {
            events.push(event);
        }
        Ok(())
    }
}
