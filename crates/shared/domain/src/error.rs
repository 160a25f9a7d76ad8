//! Domain-level errors.
//!
//! These errors represent business rule violations and domain logic failures.
//! They are independent of infrastructure concerns (HTTP, database).

use thiserror::Error;

/// Domain-specific errors for business rule violations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Validation failed for a field or input
    #[error("Validation error: {0}")]
    Validation(String),

    /// An operation needs an authenticated caller but none is present
    #[error("An authenticated user is required to {0}")]
    MissingActor(String),

    /// A time zone name could not be resolved
    #[error("Unknown time zone: {0}")]
    UnknownTimeZone(String),

    /// A wall-clock time does not exist in the given zone (DST gap)
    #[error("{0} does not exist in time zone {1}")]
    NonexistentLocalTime(String, String),

    /// Internal domain error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        DomainError::Validation(msg.into())
    }

    /// Create a missing-actor error for the given action
    pub fn missing_actor(action: impl Into<String>) -> Self {
        DomainError::MissingActor(action.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        DomainError::Internal(msg.into())
    }
}

/// Result type alias for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
