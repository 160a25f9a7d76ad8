//! Unified error handling.
//!
//! One error type for every layer. At the service boundary it renders into
//! the failed [`Response`] envelope with a user-safe message; internal
//! details are logged instead of returned.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response as HttpResponse},
};
use domain::DomainError;
use thiserror::Error;

use crate::response::Response;

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication & Authorization
    #[error("Authentication required")]
    Unauthorized,

    #[error("Access denied")]
    Forbidden,

    // Resource errors
    #[error("Resource not found")]
    NotFound,

    #[error("Entity \"{entity}\" ({key}) was added before.")]
    AlreadyExists { entity: String, key: String },

    #[error("Entity \"{entity}\" ({key}) Is Busy and Can't be deleted.")]
    EntityIsBusy { entity: String, key: String },

    #[error("{0}")]
    Conflict(String),

    // Validation
    #[error("{0}")]
    Validation(String),

    // Rate limiting
    #[error("Too many requests")]
    TooManyRequests,

    // Storage
    #[error("Persistence failure: {0}")]
    Persistence(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[cfg(feature = "database")]
    #[error("Database error")]
    Database(#[from] sea_orm::DbErr),

    // Internal
    #[error("Internal server error")]
    Internal(String),
}

impl AppError {
    /// Get error code for logs and clients
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::Forbidden => "FORBIDDEN",
            AppError::NotFound => "NOT_FOUND",
            AppError::AlreadyExists { .. } => "ALREADY_EXISTS",
            AppError::EntityIsBusy { .. } => "ENTITY_IS_BUSY",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::TooManyRequests => "TOO_MANY_REQUESTS",
            AppError::Persistence(_) => "PERSISTENCE_ERROR",
            AppError::Cancelled => "CANCELLED",
            #[cfg(feature = "database")]
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get HTTP status code
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::AlreadyExists { .. }
            | AppError::EntityIsBusy { .. }
            | AppError::Conflict(_)
            | AppError::Validation(_)
            | AppError::Cancelled => StatusCode::BAD_REQUEST,
            AppError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get user-facing message (hides internal details)
    pub fn user_message(&self) -> String {
        match self {
            // Hide details for internal errors
            AppError::Persistence(msg) => {
                tracing::error!("Persistence error: {}", msg);
                "The data store is unavailable, please try again later".to_string()
            }
            #[cfg(feature = "database")]
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "A database error occurred".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }

            // Client errors carry their own message
            _ => self.to_string(),
        }
    }

    /// Failed envelope for this error.
    pub fn to_envelope<T>(&self) -> Response<T> {
        Response::failure_with_status(self.user_message(), self.status().as_u16())
    }
}

// =============================================================================
// HTTP Response (Axum)
// =============================================================================

impl IntoResponse for AppError {
    fn into_response(self) -> HttpResponse {
        self.to_envelope::<()>().into_response()
    }
}

// =============================================================================
// Domain Error Conversion
// =============================================================================

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => AppError::Validation(msg),
            e @ DomainError::MissingActor(_) => AppError::Validation(e.to_string()),
            e @ DomainError::UnknownTimeZone(_) => AppError::Internal(e.to_string()),
            e @ DomainError::NonexistentLocalTime(_, _) => AppError::Validation(e.to_string()),
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Extension trait for Option -> AppError conversion
pub trait OptionExt<T> {
    fn ok_or_not_found(self) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self) -> AppResult<T> {
        self.ok_or(AppError::NotFound)
    }
}

/// Convenience constructors
impl AppError {
    pub fn conflict(msg: impl Into<String>) -> Self {
        AppError::Conflict(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn persistence(msg: impl Into<String>) -> Self {
        AppError::Persistence(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    pub fn already_exists(entity: impl Into<String>, key: impl ToString) -> Self {
        AppError::AlreadyExists {
            entity: entity.into(),
            key: key.to_string(),
        }
    }

    pub fn entity_is_busy(entity: impl Into<String>, key: impl ToString) -> Self {
        AppError::EntityIsBusy {
            entity: entity.into(),
            key: key.to_string(),
        }
    }
}
