//! # Shell Error Types
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ShellError                                    │
//! │                                                                         │
//! │  ┌──────────────────┐  ┌──────────────────┐  ┌──────────────────────┐  │
//! │  │  Configuration   │  │     Startup      │  │      Wrapped         │  │
//! │  │                  │  │                  │  │                      │  │
//! │  │  InvalidConfig   │  │  Io              │  │  Store               │  │
//! │  │  InvalidUrl      │  │  Http            │  │  Router              │  │
//! │  │  ConfigParse     │  │                  │  │  View                │  │
//! │  │  ConfigSave      │  │                  │  │                      │  │
//! │  └──────────────────┘  └──────────────────┘  └──────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant is fatal at startup. Once the console loop runs, errors are
//! handled by the router's error handler and shown as notifications.

use thiserror::Error;

/// Result type alias for shell operations.
pub type ShellResult<T> = Result<T, ShellError>;

/// Shell error type.
#[derive(Debug, Error)]
pub enum ShellError {
    /// A configuration value is out of range or unknown.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A configured URL does not parse.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The config file is not valid TOML for `ShellConfig`.
    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The config could not be written.
    #[error("Failed to save config: {0}")]
    ConfigSave(String),

    /// File system or stdin/stdout failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Store(#[from] till_store::StoreError),

    #[error(transparent)]
    Router(#[from] till_router::RouterError),

    #[error(transparent)]
    View(#[from] till_view::ViewError),
}

impl From<toml::ser::Error> for ShellError {
    fn from(err: toml::ser::Error) -> Self {
        ShellError::ConfigSave(err.to_string())
    }
}

impl ShellError {
    /// True for errors fixed by editing `till.toml` or the environment.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ShellError::InvalidConfig(_)
                | ShellError::InvalidUrl { .. }
                | ShellError::ConfigParse(_)
        ) || matches!(self, ShellError::Router(e) if e.is_config_error())
            || matches!(self, ShellError::Store(till_store::StoreError::InvalidConfig(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_categorized() {
        assert!(ShellError::InvalidConfig("max_visible".into()).is_config_error());
        assert!(ShellError::Store(till_store::StoreError::InvalidConfig("x".into())).is_config_error());
        assert!(!ShellError::Io(std::io::Error::other("closed")).is_config_error());
    }
}
