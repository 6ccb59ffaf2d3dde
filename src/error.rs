// src/error.rs

//! Core error taxonomy. Every external dependency gets one variant: the turn
//! controller only needs to know *which* enrichment failed, not why. Detail
//! strings are for logs.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SolaceError {
    /// The emotion classifier could not be reached or returned garbage.
    /// Turns proceed without emotion context.
    #[error("emotion classifier unavailable: {0}")]
    ClassifierUnavailable(String),

    /// The vector index or embedding service is down. Turns proceed without
    /// retrieved context.
    #[error("document retriever unavailable: {0}")]
    RetrieverUnavailable(String),

    /// Chat completion failed (auth, rate limit, or network). The turn still
    /// produces a fixed fallback reply.
    #[error("language model unavailable: {0}")]
    LlmUnavailable(String),

    /// Bad mode/personality value. Rejected when the configuration is set,
    /// never mid-turn.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl SolaceError {
    /// True for the fail-soft variants a turn degrades around.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, SolaceError::InvalidConfiguration(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_configuration_is_fatal() {
        assert!(!SolaceError::InvalidConfiguration("bad mode".into()).is_recoverable());
        assert!(SolaceError::ClassifierUnavailable("timeout".into()).is_recoverable());
        assert!(SolaceError::LlmUnavailable("401".into()).is_recoverable());
    }
}
