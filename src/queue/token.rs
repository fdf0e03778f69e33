//! Session token generation

use crate::types::SessionToken;
use crate::utils::{generate_session_token, SESSION_TOKEN_LENGTH};

/// Source of session tokens for new rounds
#[cfg_attr(test, mockall::automock)]
pub trait TokenGenerator: Send + Sync {
    /// Produce a token for a round that is about to start collecting players
    fn next_token(&self) -> SessionToken;
}

/// Random alphanumeric tokens of a fixed length
#[derive(Debug, Clone)]
pub struct RandomTokenGenerator {
    length: usize,
}

impl RandomTokenGenerator {
    pub fn new() -> Self {
        Self::with_length(SESSION_TOKEN_LENGTH)
    }

    pub fn with_length(length: usize) -> Self {
        Self { length }
    }

    pub fn length(&self) -> usize {
        self.length
    }
}

impl Default for RandomTokenGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenGenerator for RandomTokenGenerator {
    fn next_token(&self) -> SessionToken {
        SessionToken::new(generate_session_token(self.length))
    }
}
