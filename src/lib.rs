//! Briscola Lobby - Waiting queues for briscola matches
//!
//! This crate provides named, capacity-bounded waiting queues that seat
//! players until a table is full and then hand the seated players to a match
//! under a fresh session token. The core registry is synchronous and safe to
//! share between threads; an async service layer adds events, metrics and an
//! HTTP API on top.

pub mod config;
pub mod error;
pub mod events;
pub mod metrics;
pub mod queue;
pub mod service;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{QueueError, QueueResult, Result};
pub use types::*;

// Re-export key components
pub use events::EventPublisher;
pub use queue::{GameSessionAssembler, MatchAssembler, QueueRegistry, TokenGenerator};
pub use service::QueueService;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
