//! Test fixtures shared by the integration test binaries

#![allow(dead_code)]

use anyhow::anyhow;
use async_trait::async_trait;
use briscola_lobby::error::Result;
use briscola_lobby::events::EventPublisher;
use briscola_lobby::queue::{QueueRegistry, TokenGenerator};
use briscola_lobby::service::QueueService;
use briscola_lobby::types::{JoinRequest, QueueEvent, SessionToken};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Token generator producing `round-0`, `round-1`, ... in order
#[derive(Debug, Default)]
pub struct SequentialTokenGenerator {
    next: AtomicUsize,
}

impl SequentialTokenGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tokens handed out so far
    pub fn issued(&self) -> usize {
        self.next.load(Ordering::SeqCst)
    }
}

impl TokenGenerator for SequentialTokenGenerator {
    fn next_token(&self) -> SessionToken {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        SessionToken::new(format!("round-{}", n))
    }
}

/// Publisher that keeps every event for later assertions
#[derive(Debug, Default)]
pub struct RecordingEventPublisher {
    published_events: Mutex<Vec<QueueEvent>>,
}

impl RecordingEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_published_events(&self) -> Vec<QueueEvent> {
        self.published_events.lock().unwrap().clone()
    }

    pub fn count_events_of_type(&self, event_type: &str) -> usize {
        self.get_published_events()
            .iter()
            .filter(|event| event.event_type() == event_type)
            .count()
    }

    pub fn clear_events(&self) {
        self.published_events.lock().unwrap().clear();
    }
}

#[async_trait]
impl EventPublisher for RecordingEventPublisher {
    async fn publish(&self, event: QueueEvent) -> Result<()> {
        self.published_events.lock().unwrap().push(event);
        Ok(())
    }
}

/// Publisher that rejects every event
#[derive(Debug, Default)]
pub struct FailingEventPublisher;

#[async_trait]
impl EventPublisher for FailingEventPublisher {
    async fn publish(&self, event: QueueEvent) -> Result<()> {
        Err(anyhow!("publisher offline, dropped {}", event.event_type()))
    }
}

/// Service backed by a default registry and a recording publisher
pub fn create_test_service() -> (QueueService, Arc<RecordingEventPublisher>) {
    let publisher = Arc::new(RecordingEventPublisher::new());
    let service = QueueService::new(QueueRegistry::default(), publisher.clone());
    (service, publisher)
}

/// Service whose session tokens are predictable
pub fn create_sequential_service() -> (
    QueueService,
    Arc<RecordingEventPublisher>,
    Arc<SequentialTokenGenerator>,
) {
    let tokens = Arc::new(SequentialTokenGenerator::new());
    let registry = QueueRegistry::default().with_token_generator(tokens.clone());
    let publisher = Arc::new(RecordingEventPublisher::new());
    let service = QueueService::new(registry, publisher.clone());
    (service, publisher, tokens)
}

pub fn join_request(queue: &str, player_name: &str, player_id: &str) -> JoinRequest {
    JoinRequest {
        queue: queue.to_string(),
        player_name: player_name.to_string(),
        player_id: player_id.to_string(),
    }
}
