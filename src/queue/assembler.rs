//! Match assembly for rounds that reached capacity

use crate::types::{GameSession, Player, SessionToken};
use crate::utils::{current_timestamp, generate_game_id};

/// Builds the started match from a finalized player set
///
/// Called by the registry after the queue has been reset and its lock
/// released, with the round's immutable snapshot.
pub trait MatchAssembler: Send + Sync {
    type Match;

    fn assemble(&self, players: Vec<Player>, session_token: &SessionToken) -> Self::Match;
}

impl<F, M> MatchAssembler for F
where
    F: Fn(Vec<Player>, &SessionToken) -> M + Send + Sync,
{
    type Match = M;

    fn assemble(&self, players: Vec<Player>, session_token: &SessionToken) -> M {
        self(players, session_token)
    }
}

/// Assembles `GameSession`s tagged with a fresh game id
#[derive(Debug, Clone, Copy, Default)]
pub struct GameSessionAssembler;

impl GameSessionAssembler {
    pub fn new() -> Self {
        Self
    }
}

impl MatchAssembler for GameSessionAssembler {
    type Match = GameSession;

    fn assemble(&self, players: Vec<Player>, session_token: &SessionToken) -> GameSession {
        GameSession {
            game_id: generate_game_id(),
            session_token: session_token.clone(),
            players,
            started_at: current_timestamp(),
        }
    }
}
