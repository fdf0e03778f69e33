//! Error types for the lobby service
//!
//! Queue operations return the typed [`QueueError`] so callers can react to
//! each rejection. Application plumbing (configuration, startup, servers,
//! event publishing) uses anyhow through the [`Result`] alias.

/// Result type alias for application-level code
pub type Result<T> = anyhow::Result<T>;

/// Result type returned by registry operations
pub type QueueResult<T> = std::result::Result<T, QueueError>;

/// Rejections produced by queue operations
///
/// Everything except `Internal` is caller-correctable: retry with different
/// input, wait and retry, or surface it to the end user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    #[error("Waiting queue already exists: {name}")]
    AlreadyExists { name: String },

    #[error("Waiting queue not found: {name}")]
    NotFound { name: String },

    #[error("Waiting queue is full: {name} ({capacity} players)")]
    Full { name: String, capacity: usize },

    #[error("Player {player_id} is already waiting in queue {name}")]
    Duplicate { name: String, player_id: String },

    #[error("Waiting for players in queue {name}: {joined}/{capacity}")]
    NotReady {
        name: String,
        joined: usize,
        capacity: usize,
    },

    #[error("Invalid queue name: {reason}")]
    InvalidName { reason: String },

    #[error("Invalid queue capacity {capacity}: {reason}")]
    InvalidCapacity { capacity: usize, reason: String },

    #[error("Internal service error: {message}")]
    Internal { message: String },
}

impl QueueError {
    /// Stable label for metrics and API error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            QueueError::AlreadyExists { .. } => "already_exists",
            QueueError::NotFound { .. } => "not_found",
            QueueError::Full { .. } => "full",
            QueueError::Duplicate { .. } => "duplicate",
            QueueError::NotReady { .. } => "not_ready",
            QueueError::InvalidName { .. } => "invalid_name",
            QueueError::InvalidCapacity { .. } => "invalid_capacity",
            QueueError::Internal { .. } => "internal",
        }
    }

    pub(crate) fn poisoned(what: &str) -> Self {
        QueueError::Internal {
            message: format!("Failed to acquire {} lock", what),
        }
    }
}
