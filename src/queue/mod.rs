//! Waiting queue management
//!
//! This module holds the queue entity, the registry that owns queues and
//! serializes operations on them, session token generation, and the seam
//! through which full rounds become matches.

pub mod assembler;
pub mod instance;
pub mod registry;
pub mod token;

// Re-export commonly used types
pub use assembler::{GameSessionAssembler, MatchAssembler};
pub use instance::{FilledRound, WaitingQueue};
pub use registry::{QueueRegistry, RegistryStats, DEFAULT_MAX_CAPACITY};
pub use token::{RandomTokenGenerator, TokenGenerator};
