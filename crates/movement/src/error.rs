//! Errors raised at the crate's fallible boundaries.
//!
//! Gameplay decisions inside a tick never fail; only loading tuning data and
//! restoring saved state do.

use thiserror::Error;

use crate::hsm::StateId;

/// Errors that can occur while loading or validating movement tuning.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value for {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Errors that can occur while saving or restoring movement state.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("encode error: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("decode error: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("snapshot for {0:?} is missing its session data")]
    MissingSession(StateId),
}
