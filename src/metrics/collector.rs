//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for the briscola-lobby service
//! using Prometheus metrics.

use crate::queue::RegistryStats;
use anyhow::Result;
use prometheus::{
    HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector for the lobby service
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Service-level metrics
    service_metrics: ServiceMetrics,

    /// Queue-related metrics
    queue_metrics: QueueMetrics,

    /// Performance metrics
    performance_metrics: PerformanceMetrics,
}

/// Service-level metrics
#[derive(Clone)]
pub struct ServiceMetrics {
    /// Service uptime in seconds
    pub uptime_seconds: IntGauge,

    /// Registered queues
    pub active_queues: IntGauge,
}

/// Queue-related metrics
#[derive(Clone)]
pub struct QueueMetrics {
    /// Total queues created
    pub queues_created_total: IntCounter,

    /// Total successful joins by queue
    pub players_joined_total: IntCounterVec,

    /// Rejected operations by operation and reason
    pub rejections_total: IntCounterVec,

    /// Total matches started by queue
    pub matches_started_total: IntCounterVec,

    /// Players currently waiting by queue
    pub players_waiting: IntGaugeVec,
}

/// Performance metrics
#[derive(Clone)]
pub struct PerformanceMetrics {
    /// Queue operation durations
    pub operation_duration: HistogramVec,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let service_metrics = ServiceMetrics::new(&registry)?;
        let queue_metrics = QueueMetrics::new(&registry)?;
        let performance_metrics = PerformanceMetrics::new(&registry)?;

        Ok(Self {
            registry,
            service_metrics,
            queue_metrics,
            performance_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Get service metrics
    pub fn service(&self) -> &ServiceMetrics {
        &self.service_metrics
    }

    /// Get queue metrics
    pub fn queue(&self) -> &QueueMetrics {
        &self.queue_metrics
    }

    /// Get performance metrics
    pub fn performance(&self) -> &PerformanceMetrics {
        &self.performance_metrics
    }

    /// Update gauges from registry stats
    ///
    /// Overwrites every per-queue waiting gauge with the registry's count.
    pub fn update_from_registry_stats(&self, stats: &RegistryStats) {
        self.service_metrics
            .active_queues
            .set(stats.active_queues as i64);
        for (queue, waiting) in &stats.waiting_by_queue {
            self.queue_metrics
                .players_waiting
                .with_label_values(&[queue.as_str()])
                .set(*waiting as i64);
        }
    }

    /// Record a queue being created
    pub fn record_queue_created(&self, queue: &str) {
        self.queue_metrics.queues_created_total.inc();
        self.service_metrics.active_queues.inc();
        self.queue_metrics
            .players_waiting
            .with_label_values(&[queue])
            .set(0);
    }

    /// Record a successful join and the resulting queue size
    pub fn record_player_joined(&self, queue: &str, waiting: usize) {
        self.queue_metrics
            .players_joined_total
            .with_label_values(&[queue])
            .inc();
        self.queue_metrics
            .players_waiting
            .with_label_values(&[queue])
            .set(waiting as i64);
    }

    /// Record a rejected operation by error kind
    pub fn record_rejection(&self, operation: &str, reason: &str) {
        self.queue_metrics
            .rejections_total
            .with_label_values(&[operation, reason])
            .inc();
    }

    /// Record a match starting; the queue is empty again afterwards
    pub fn record_match_started(&self, queue: &str) {
        self.queue_metrics
            .matches_started_total
            .with_label_values(&[queue])
            .inc();
        self.queue_metrics
            .players_waiting
            .with_label_values(&[queue])
            .set(0);
    }

    /// Record queue operation duration
    pub fn record_operation(&self, operation: &str, duration: Duration) {
        self.performance_metrics
            .operation_duration
            .with_label_values(&[operation])
            .observe(duration.as_secs_f64());
    }

    /// Set service uptime
    pub fn update_uptime(&self, uptime: Duration) {
        self.service_metrics
            .uptime_seconds
            .set(uptime.as_secs() as i64);
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new().expect("Failed to create default metrics collector")
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl ServiceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let uptime_seconds =
            IntGauge::new("briscola_lobby_uptime_seconds", "Service uptime in seconds")?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        let active_queues =
            IntGauge::new("briscola_lobby_active_queues", "Number of registered queues")?;
        registry.register(Box::new(active_queues.clone()))?;

        Ok(Self {
            uptime_seconds,
            active_queues,
        })
    }
}

impl QueueMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let queues_created_total = IntCounter::new(
            "briscola_lobby_queues_created_total",
            "Total queues created",
        )?;
        registry.register(Box::new(queues_created_total.clone()))?;

        let players_joined_total = IntCounterVec::new(
            Opts::new(
                "briscola_lobby_players_joined_total",
                "Total players joined",
            ),
            &["queue"],
        )?;
        registry.register(Box::new(players_joined_total.clone()))?;

        let rejections_total = IntCounterVec::new(
            Opts::new(
                "briscola_lobby_rejections_total",
                "Total rejected queue operations",
            ),
            &["operation", "reason"],
        )?;
        registry.register(Box::new(rejections_total.clone()))?;

        let matches_started_total = IntCounterVec::new(
            Opts::new(
                "briscola_lobby_matches_started_total",
                "Total matches started",
            ),
            &["queue"],
        )?;
        registry.register(Box::new(matches_started_total.clone()))?;

        let players_waiting = IntGaugeVec::new(
            Opts::new(
                "briscola_lobby_players_waiting",
                "Players currently waiting",
            ),
            &["queue"],
        )?;
        registry.register(Box::new(players_waiting.clone()))?;

        Ok(Self {
            queues_created_total,
            players_joined_total,
            rejections_total,
            matches_started_total,
            players_waiting,
        })
    }
}

impl PerformanceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let operation_duration = HistogramVec::new(
            HistogramOpts::new(
                "briscola_lobby_operation_duration_seconds",
                "Queue operation duration",
            )
            .buckets(vec![0.00001, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05]),
            &["operation"],
        )?;
        registry.register(Box::new(operation_duration.clone()))?;

        Ok(Self { operation_duration })
    }
}
