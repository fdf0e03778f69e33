//! Common types used throughout the lobby service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of a player
pub type PlayerId = String;

/// Unique key of a waiting queue
pub type QueueName = String;

/// Unique identifier for started games
pub type GameId = Uuid;

/// A player waiting for a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub id: PlayerId,
}

impl Player {
    pub fn new(name: impl Into<String>, id: impl Into<PlayerId>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }

    /// Identity comparison; display names are not part of a player's identity
    pub fn is(&self, other: &Player) -> bool {
        self.id == other.id
    }
}

/// Opaque token tagging one round of a queue and the match it produces
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SessionToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Result of a successful start: the token of the round that filled, and
/// the match assembled from its players
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchStart<M> {
    pub session_token: SessionToken,
    pub game: M,
}

/// Default match representation produced by `GameSessionAssembler`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSession {
    pub game_id: GameId,
    pub session_token: SessionToken,
    pub players: Vec<Player>,
    pub started_at: DateTime<Utc>,
}

/// Point-in-time copy of a waiting queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub name: QueueName,
    pub capacity: usize,
    pub session_token: SessionToken,
    pub members: Vec<Player>,
    pub rounds_started: u64,
    pub created_at: DateTime<Utc>,
}

impl QueueSnapshot {
    pub fn is_full(&self) -> bool {
        self.members.len() >= self.capacity
    }

    pub fn open_seats(&self) -> usize {
        self.capacity.saturating_sub(self.members.len())
    }
}

/// Outcome of a join as reported by the queue service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinOutcome {
    pub queue: QueueName,
    pub player_id: PlayerId,
    /// Members waiting after this join (0 if an auto-start already drained them)
    pub waiting: usize,
    pub capacity: usize,
    pub is_full: bool,
    /// Present when the join filled the queue and auto-start launched the match
    pub started: Option<MatchStart<GameSession>>,
}

/// Request to join a waiting queue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRequest {
    pub queue: QueueName,
    pub player_name: String,
    pub player_id: PlayerId,
}

/// Event emitted when a queue is registered
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueCreated {
    pub queue: QueueName,
    pub capacity: usize,
    pub timestamp: DateTime<Utc>,
}

/// Event emitted when a player joins a queue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerJoinedQueue {
    pub queue: QueueName,
    pub player: Player,
    pub waiting: usize,
    pub capacity: usize,
    pub timestamp: DateTime<Utc>,
}

/// Event emitted when a join brings a queue to capacity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueFilled {
    pub queue: QueueName,
    pub players: Vec<Player>,
    pub timestamp: DateTime<Utc>,
}

/// Event emitted when a round hands its players off to a new match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchStarted {
    pub queue: QueueName,
    pub game_id: GameId,
    pub session_token: SessionToken,
    pub players: Vec<Player>,
    pub timestamp: DateTime<Utc>,
}

/// Union type for all published events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum QueueEvent {
    QueueCreated(QueueCreated),
    PlayerJoinedQueue(PlayerJoinedQueue),
    QueueFilled(QueueFilled),
    MatchStarted(MatchStarted),
}

impl QueueEvent {
    /// Name of the queue the event belongs to
    pub fn queue(&self) -> &str {
        match self {
            QueueEvent::QueueCreated(e) => &e.queue,
            QueueEvent::PlayerJoinedQueue(e) => &e.queue,
            QueueEvent::QueueFilled(e) => &e.queue,
            QueueEvent::MatchStarted(e) => &e.queue,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            QueueEvent::QueueCreated(_) => "QueueCreated",
            QueueEvent::PlayerJoinedQueue(_) => "PlayerJoinedQueue",
            QueueEvent::QueueFilled(_) => "QueueFilled",
            QueueEvent::MatchStarted(_) => "MatchStarted",
        }
    }
}
