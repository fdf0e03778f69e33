//! Utility functions for the lobby service

use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use uuid::Uuid;

/// Default length of a session token (62-symbol alphabet, ~190 bits)
pub const SESSION_TOKEN_LENGTH: usize = 32;

/// Generate a random alphanumeric session token of the given length
///
/// Uses the calling thread's generator, so concurrent callers never share
/// random state.
pub fn generate_session_token(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Generate a new unique game ID
pub fn generate_game_id() -> Uuid {
    Uuid::new_v4()
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}
