//! # AppError
//!
//! Centralized error handling for the Hooks backend.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// The primary error type for all hk-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Negative point value passed to the ledger
    #[error("invalid point amount: {0}")]
    InvalidAmount(i64),

    /// Point source outside the fixed enumeration
    #[error("unknown point source: {0}")]
    UnknownSource(String),

    /// Underlying query or write failed
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Achievement definition with a threshold that is not strictly positive
    #[error("achievement '{name}' has invalid threshold {threshold}")]
    InvalidThreshold { name: String, threshold: i64 },

    /// Resource not found (e.g., Book, Club, Quote submission)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Validation failure (e.g., quote too short, missing title)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Missing or rejected credentials
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated, but not allowed (e.g., non-admin moderating quotes)
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Resource already exists or is in the wrong state (e.g., second active timer)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Failure outside storage (e.g., password hashing, token signing)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        AppError::NotFound(entity.to_string(), id.to_string())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::ValidationError(msg.into())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::StorageUnavailable(format!("{err:#}"))
    }
}

/// A specialized Result type for Hooks logic.
pub type Result<T> = std::result::Result<T, AppError>;
