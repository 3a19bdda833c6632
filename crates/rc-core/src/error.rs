//! # AppError
//!
//! Centralized error handling for the community portal.
//! Every service operation fails with one of these variants; nothing is retried.

use thiserror::Error;

/// The primary error type for all rc-core operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// No acting identity (signed out, expired token, bad credentials)
    #[error("not authenticated: {0}")]
    Unauthenticated(String),

    /// Identity present but lacking the required role or ownership
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Validation failure (e.g., empty comment, malformed username)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Resource not found (e.g., Announcement, Comment, Profile)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Resource already exists (e.g., taken username, duplicate reaction)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Infrastructure failure (e.g., database down, disk full)
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
}

impl AppError {
    pub fn not_found(kind: &str, id: impl ToString) -> Self {
        AppError::NotFound(kind.to_string(), id.to_string())
    }

    /// Recovers a typed error raised by an adapter, or classifies the
    /// failure as a transport/service problem.
    pub fn from_backend(err: anyhow::Error) -> Self {
        match err.downcast::<AppError>() {
            Ok(app) => app,
            Err(other) => {
                log::error!("backend call failed: {other:#}");
                AppError::BackendUnavailable(other.to_string())
            }
        }
    }
}

/// A specialized Result type for portal logic.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_errors_survive_the_anyhow_boundary() {
        let wrapped = anyhow::Error::new(AppError::Conflict("reaction exists".into()));
        assert_eq!(
            AppError::from_backend(wrapped),
            AppError::Conflict("reaction exists".into())
        );
    }

    #[test]
    fn foreign_errors_become_backend_unavailable() {
        let err = AppError::from_backend(anyhow::anyhow!("connection refused"));
        assert!(matches!(err, AppError::BackendUnavailable(msg) if msg.contains("refused")));
    }
}
