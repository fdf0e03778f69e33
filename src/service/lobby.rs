//! Queue service orchestrating the registry, metrics, and events
//!
//! `QueueService` is what the outer surfaces talk to. The registry decides
//! every outcome; this layer times the operation, logs it, counts it, and
//! publishes a notification once the registry has committed.

use crate::error::{QueueError, QueueResult};
use crate::events::EventPublisher;
use crate::metrics::MetricsCollector;
use crate::queue::{QueueRegistry, RegistryStats};
use crate::types::{
    GameSession, JoinOutcome, JoinRequest, MatchStart, MatchStarted, Player, PlayerJoinedQueue,
    QueueCreated, QueueEvent, QueueFilled, QueueName, QueueSnapshot,
};
use crate::utils::current_timestamp;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Async facade over a `QueueRegistry` of game sessions
#[derive(Clone)]
pub struct QueueService {
    /// Registry owning all waiting queues
    registry: QueueRegistry,
    /// Event publisher for queue events
    event_publisher: Arc<dyn EventPublisher>,
    /// Metrics collector for recording performance data
    metrics_collector: Arc<MetricsCollector>,
    /// Start matches from the join that fills a queue
    auto_start_when_full: bool,
}

impl QueueService {
    /// Create a new queue service with its own metrics collector
    pub fn new(registry: QueueRegistry, event_publisher: Arc<dyn EventPublisher>) -> Self {
        Self::with_metrics(
            registry,
            event_publisher,
            Arc::new(MetricsCollector::default()),
        )
    }

    /// Create a new queue service with a shared metrics collector
    pub fn with_metrics(
        registry: QueueRegistry,
        event_publisher: Arc<dyn EventPublisher>,
        metrics_collector: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            registry,
            event_publisher,
            metrics_collector,
            auto_start_when_full: false,
        }
    }

    /// Enable or disable starting matches as soon as a queue fills
    pub fn with_auto_start(mut self, enabled: bool) -> Self {
        self.auto_start_when_full = enabled;
        self
    }

    pub fn auto_start_when_full(&self) -> bool {
        self.auto_start_when_full
    }

    pub fn registry(&self) -> &QueueRegistry {
        &self.registry
    }

    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics_collector.clone()
    }

    /// Register a new waiting queue
    pub async fn create_queue(&self, name: &str, capacity: usize) -> QueueResult<QueueSnapshot> {
        let timer = self.metrics_collector.start_timer();
        let result = self
            .registry
            .create_queue(name, capacity)
            .and_then(|_| self.registry.queue_snapshot(name));
        self.metrics_collector
            .record_operation("create", timer.stop());

        let snapshot = result.map_err(|err| self.rejected("create", name, err))?;

        self.metrics_collector.record_queue_created(name);
        info!(queue = name, capacity, "Created waiting queue");

        self.publish(QueueEvent::QueueCreated(QueueCreated {
            queue: name.to_string(),
            capacity,
            timestamp: current_timestamp(),
        }))
        .await;

        Ok(snapshot)
    }

    /// Seat a player in a waiting queue
    pub async fn join_queue(&self, request: JoinRequest) -> QueueResult<JoinOutcome> {
        let JoinRequest {
            queue,
            player_name,
            player_id,
        } = request;
        let player = Player::new(player_name, player_id);

        let timer = self.metrics_collector.start_timer();
        let result = self.registry.join(&queue, player.clone());
        self.metrics_collector.record_operation("join", timer.stop());

        let snapshot = result.map_err(|err| self.rejected("join", &queue, err))?;
        let waiting = snapshot.members.len();
        let is_full = snapshot.is_full();

        self.metrics_collector.record_player_joined(&queue, waiting);
        info!(
            queue = %queue,
            player_id = %player.id,
            waiting,
            capacity = snapshot.capacity,
            "Player joined waiting queue"
        );

        self.publish(QueueEvent::PlayerJoinedQueue(PlayerJoinedQueue {
            queue: queue.clone(),
            player: player.clone(),
            waiting,
            capacity: snapshot.capacity,
            timestamp: current_timestamp(),
        }))
        .await;

        let mut started = None;
        if is_full {
            info!(queue = %queue, "Waiting queue is full");
            self.publish(QueueEvent::QueueFilled(QueueFilled {
                queue: queue.clone(),
                players: snapshot.members.clone(),
                timestamp: current_timestamp(),
            }))
            .await;

            if self.auto_start_when_full {
                started = self.auto_start(&queue).await;
            }
        }

        Ok(JoinOutcome {
            queue,
            player_id: player.id,
            waiting: if started.is_some() { 0 } else { waiting },
            capacity: snapshot.capacity,
            is_full,
            started,
        })
    }

    /// Start the match for a full queue and reset it for the next round
    pub async fn start_match(&self, name: &str) -> QueueResult<MatchStart<GameSession>> {
        let timer = self.metrics_collector.start_timer();
        let result = self.registry.start_match(name);
        self.metrics_collector.record_operation("start", timer.stop());

        let started = result.map_err(|err| self.rejected("start", name, err))?;

        self.metrics_collector.record_match_started(name);
        info!(
            queue = name,
            game_id = %started.game.game_id,
            session_token = %started.session_token,
            players = started.game.players.len(),
            "Match started"
        );

        self.publish(QueueEvent::MatchStarted(MatchStarted {
            queue: name.to_string(),
            game_id: started.game.game_id,
            session_token: started.session_token.clone(),
            players: started.game.players.clone(),
            timestamp: current_timestamp(),
        }))
        .await;

        Ok(started)
    }

    pub async fn queue_snapshot(&self, name: &str) -> QueueResult<QueueSnapshot> {
        self.registry.queue_snapshot(name)
    }

    pub async fn queue_names(&self) -> QueueResult<Vec<QueueName>> {
        self.registry.queue_names()
    }

    /// Current registry statistics; also refreshes the queue gauges
    pub async fn stats(&self) -> QueueResult<RegistryStats> {
        let stats = self.registry.stats()?;
        self.metrics_collector.update_from_registry_stats(&stats);
        Ok(stats)
    }

    async fn auto_start(&self, queue: &str) -> Option<MatchStart<GameSession>> {
        match self.start_match(queue).await {
            Ok(started) => Some(started),
            // Another caller started this round between our join and our start
            Err(QueueError::NotReady { .. }) => None,
            Err(err) => {
                warn!(queue, error = %err, "Auto-start failed");
                None
            }
        }
    }

    fn rejected(&self, operation: &str, queue: &str, err: QueueError) -> QueueError {
        debug!(operation, queue, reason = err.kind(), error = %err, "Queue operation rejected");
        self.metrics_collector.record_rejection(operation, err.kind());
        err
    }

    async fn publish(&self, event: QueueEvent) {
        let event_type = event.event_type();
        if let Err(e) = self.event_publisher.publish(event).await {
            warn!("Failed to publish {} event: {}", event_type, e);
        }
    }
}
