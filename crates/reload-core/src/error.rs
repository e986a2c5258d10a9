//! Error types for reload core operations.
//!
//! Errors are descriptive at the core level; the CLI layer maps these
//! to user-facing messages. Secondary effects that fail after a primary
//! write has committed are not errors: they are reported as
//! [`Warning`](crate::outcome::Warning)s on the action outcome.

use thiserror::Error;
use uuid::Uuid;

use crate::quota::LimitKind;

/// Result type alias for reload operations.
pub type Result<T> = std::result::Result<T, ReloadError>;

/// Core error type for reload operations.
#[derive(Debug, Error)]
pub enum ReloadError {
    /// Input rejected before any write was issued
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found (or not owned by the caller)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Tier ceiling reached for an entity kind
    #[error("Quota exceeded: {kind} limit of {ceiling} reached")]
    QuotaExceeded { kind: LimitKind, ceiling: u32 },

    /// Component stock cannot cover a production run (reject policy only)
    #[error("Insufficient stock for component {component}: need {needed}, have {available}")]
    InsufficientStock {
        component: Uuid,
        needed: f64,
        available: f64,
    },

    /// Batch cannot cover a shooting session
    #[error("Insufficient rounds: requested {requested}, {available} remaining")]
    InsufficientRounds { requested: u32, available: u32 },

    /// Storage backend error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Primary write failed and compensation could not fully undo earlier steps
    #[error("Partial failure: {message} (unreconciled: {stranded:?})")]
    PartialFailure { message: String, stranded: Vec<Uuid> },

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Generic error (fallback)
    #[error("{0}")]
    Other(String),
}

impl From<std::io::Error> for ReloadError {
    fn from(err: std::io::Error) -> Self {
        ReloadError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for ReloadError {
    fn from(err: serde_json::Error) -> Self {
        ReloadError::Validation(err.to_string())
    }
}

impl From<rusqlite::Error> for ReloadError {
    fn from(err: rusqlite::Error) -> Self {
        ReloadError::Storage(err.to_string())
    }
}
