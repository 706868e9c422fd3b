//! # Router Error Types
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Configuration (fail fast)     Navigation (recovered, reported)         │
//! │  ─────────────────────────     ───────────────────────────────          │
//! │  Pattern                       Middleware    (navigation blocked)       │
//! │  UnknownRoute                  Handler       (route handler failed)     │
//! │  MissingParam                  NotFound      (fallback also unmatched)  │
//! │                                RedirectLoop  (redirect depth exceeded)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Navigation errors never escape `navigate`; they reach the configured
//! error handler or the log.

use thiserror::Error;
use till_core::PatternError;

/// Boxed error returned by handlers and middleware.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type alias for router operations.
pub type RouterResult<T> = Result<T, RouterError>;

/// Router error type.
#[derive(Debug, Error)]
pub enum RouterError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// A route pattern failed to compile.
    #[error(transparent)]
    Pattern(#[from] PatternError),

    /// `url_for` was called with a name no route carries.
    #[error("No route named '{0}'")]
    UnknownRoute(String),

    /// `url_for` was missing a parameter the pattern needs.
    #[error("Missing parameter for route '{route}'")]
    MissingParam { route: String },

    // =========================================================================
    // Navigation Errors
    // =========================================================================
    /// A middleware returned an error; the navigation was blocked.
    #[error("Middleware failed for {path}: {reason}")]
    Middleware { path: String, reason: String },

    /// The matched route handler failed.
    #[error("Route handler failed for {path}: {source}")]
    Handler {
        path: String,
        #[source]
        source: BoxError,
    },

    /// Neither the path nor the fallback matched a route.
    #[error("No route matches {0}")]
    NotFound(String),

    /// Redirects kept chaining past the limit.
    #[error("Redirect limit exceeded while navigating to {0}")]
    RedirectLoop(String),
}

impl RouterError {
    /// True for errors caused by router setup rather than a navigation.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            RouterError::Pattern(_) | RouterError::UnknownRoute(_) | RouterError::MissingParam { .. }
        )
    }

    /// The navigation target involved, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            RouterError::Middleware { path, .. } | RouterError::Handler { path, .. } => Some(path),
            RouterError::NotFound(path) | RouterError::RedirectLoop(path) => Some(path),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        let pattern: RouterError = PatternError::Empty.into();
        assert!(pattern.is_config_error());
        assert!(pattern.path().is_none());

        let handler = RouterError::Handler {
            path: "/pos".into(),
            source: "boom".into(),
        };
        assert!(!handler.is_config_error());
        assert_eq!(handler.path(), Some("/pos"));
        assert_eq!(handler.to_string(), "Route handler failed for /pos: boom");
    }
}
