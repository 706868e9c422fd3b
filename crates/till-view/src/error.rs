//! # View Error Types
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Lifecycle              Collaborators           Registry                │
//! │  ─────────              ─────────────           ────────                │
//! │  Init                   Api (status, message)   UnknownView             │
//! │  Render                 Validation                                      │
//! │  NotInitialized                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for view operations.
pub type ViewResult<T> = Result<T, ViewError>;

/// Error raised by the API client collaborator.
///
/// `status` follows HTTP semantics; `0` means the request never got a
/// response (connection refused, timeout, bad body).
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("API error {status}: {message}")]
pub struct ApiError {
    pub status: u16,
    pub message: String,
}

impl ApiError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        ApiError {
            status,
            message: message.into(),
        }
    }

    /// A failure with no HTTP response.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(0, message)
    }

    /// Session missing or expired.
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    /// Worth retrying later (no response, or a server-side failure).
    pub fn is_retryable(&self) -> bool {
        self.status == 0 || self.status >= 500
    }
}

/// View error type.
#[derive(Debug, Error)]
pub enum ViewError {
    /// `on_init` failed.
    #[error("View '{view}' failed to initialize: {reason}")]
    Init { view: String, reason: String },

    /// `render` failed.
    #[error("View '{view}' failed to render: {reason}")]
    Render { view: String, reason: String },

    /// `destroy` ran while `init` was still awaiting `on_init`.
    #[error("View '{0}' was destroyed during init")]
    DestroyedDuringInit(String),

    /// `render` was called before a successful `init`.
    #[error("View '{0}' is not initialized")]
    NotInitialized(String),

    /// A call to the API client failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Submitted form data failed validation.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// The registry has no factory for the requested view.
    #[error("No view registered for {0}")]
    UnknownView(String),
}

impl ViewError {
    /// The API error behind this failure, if any.
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            ViewError::Api(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_categories() {
        assert!(ApiError::new(401, "expired").is_unauthorized());
        assert!(ApiError::transport("refused").is_retryable());
        assert!(ApiError::new(503, "down").is_retryable());
        assert!(!ApiError::new(422, "bad sku").is_retryable());
    }

    #[test]
    fn test_view_error_wraps_api_error() {
        let err: ViewError = ApiError::new(404, "no such product").into();
        assert_eq!(err.api().map(|e| e.status), Some(404));
        assert_eq!(err.to_string(), "API error 404: no such product");
    }
}
