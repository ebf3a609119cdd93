//! # AppError
//!
//! Centralized error handling for the snipvault ecosystem.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// The primary error type for all sv-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found, or not visible to the caller
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Missing or invalid required input (e.g., blank title, too many tags)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Caller is authenticated but does not own the resource
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Missing, invalid or expired credentials
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Resource already exists (e.g., duplicate username)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Infrastructure or consistency failure (e.g., write succeeded, read-back failed)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn snippet_not_found(id: impl ToString) -> Self {
        AppError::NotFound("snippet".to_string(), id.to_string())
    }

    /// Numeric status carried to the response envelope.
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::ValidationError(_) => 400,
            AppError::Unauthorized(_) => 401,
            AppError::Forbidden(_) => 403,
            AppError::NotFound(..) => 404,
            AppError::Conflict(_) => 409,
            AppError::Internal(_) => 500,
        }
    }

    /// Stable label for logs and debug output.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound(..) => "not_found",
            AppError::ValidationError(_) => "validation",
            AppError::Forbidden(_) => "forbidden",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Conflict(_) => "conflict",
            AppError::Internal(_) => "internal",
        }
    }
}

/// Store failures surface as terminal internal errors for the request.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!(error = ?err, "store operation failed");
        AppError::Internal(err.to_string())
    }
}

/// A specialized Result type for snipvault logic.
pub type Result<T> = std::result::Result<T, AppError>;
