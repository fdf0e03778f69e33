//! Waiting queue entity
//!
//! A `WaitingQueue` collects unique players for one round at a time. It has
//! no locking of its own; the registry wraps every queue in a mutex and calls
//! these methods from inside that critical section.

use crate::error::{QueueError, QueueResult};
use crate::types::{Player, QueueName, QueueSnapshot, SessionToken};
use crate::utils::current_timestamp;
use chrono::{DateTime, Utc};

/// Players handed off by a round that reached capacity
#[derive(Debug, Clone)]
pub struct FilledRound {
    pub session_token: SessionToken,
    pub players: Vec<Player>,
}

/// One named waiting list
#[derive(Debug, Clone)]
pub struct WaitingQueue {
    name: QueueName,
    capacity: usize,
    session_token: SessionToken,
    members: Vec<Player>,
    rounds_started: u64,
    created_at: DateTime<Utc>,
}

impl WaitingQueue {
    /// Create an empty queue collecting players for the round tagged `session_token`
    pub fn new(name: impl Into<QueueName>, capacity: usize, session_token: SessionToken) -> Self {
        Self {
            name: name.into(),
            capacity,
            session_token,
            members: Vec::with_capacity(capacity),
            rounds_started: 0,
            created_at: current_timestamp(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn session_token(&self) -> &SessionToken {
        &self.session_token
    }

    pub fn members(&self) -> &[Player] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= self.capacity
    }

    pub fn rounds_started(&self) -> u64 {
        self.rounds_started
    }

    pub fn contains(&self, player: &Player) -> bool {
        self.members.iter().any(|member| member.is(player))
    }

    /// Append a player to the current round
    ///
    /// Checks fullness before identity so a full queue reports `Full` even to
    /// a player already seated in it. Returns the member count after the join.
    pub fn try_join(&mut self, player: Player) -> QueueResult<usize> {
        if self.is_full() {
            return Err(QueueError::Full {
                name: self.name.clone(),
                capacity: self.capacity,
            });
        }

        if self.contains(&player) {
            return Err(QueueError::Duplicate {
                name: self.name.clone(),
                player_id: player.id,
            });
        }

        self.members.push(player);
        Ok(self.members.len())
    }

    /// Drain a full round and re-token the queue for the next one
    ///
    /// Nothing is mutated, and no token is drawn, unless the queue is full.
    pub fn take_round<F>(&mut self, next_token: F) -> QueueResult<FilledRound>
    where
        F: FnOnce() -> SessionToken,
    {
        if !self.is_full() {
            return Err(QueueError::NotReady {
                name: self.name.clone(),
                joined: self.members.len(),
                capacity: self.capacity,
            });
        }

        let players = std::mem::replace(&mut self.members, Vec::with_capacity(self.capacity));
        let session_token = std::mem::replace(&mut self.session_token, next_token());
        self.rounds_started += 1;

        Ok(FilledRound {
            session_token,
            players,
        })
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            name: self.name.clone(),
            capacity: self.capacity,
            session_token: self.session_token.clone(),
            members: self.members.clone(),
            rounds_started: self.rounds_started,
            created_at: self.created_at,
        }
    }
}
