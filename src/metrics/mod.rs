//! Metrics and monitoring for the briscola-lobby service
//!
//! This module provides Prometheus metrics collection and timing helpers
//! for queue operations. The metrics are served by the HTTP surface in
//! `service::http`.

pub mod collector;

pub use collector::{
    MetricsCollector, MetricsTimer, PerformanceMetrics, QueueMetrics, ServiceMetrics,
};
