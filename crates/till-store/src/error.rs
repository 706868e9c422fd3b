//! # Store Error Types
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │    Backend      │  │  Serialization  │  │     Configuration       │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Backend        │  │  Serialization  │  │  InvalidConfig          │ │
//! │  │  Io             │  │  Corrupt        │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! None of these cross the `set_state` boundary: write-through failures are
//! logged there. They surface only from the storage backends themselves and
//! from the typed accessors.

use thiserror::Error;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Store error type.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Storage backend failed (SQLite).
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// File system error while opening storage.
    #[error("Storage I/O error: {0}")]
    Io(String),

    /// Value could not be (de)serialized.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Persisted value for a key is not valid JSON.
    #[error("Persisted value for '{key}' is corrupt: {reason}")]
    Corrupt { key: String, reason: String },

    /// Store configuration is invalid.
    #[error("Invalid store configuration: {0}")]
    InvalidConfig(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::Corrupt {
            key: "user".into(),
            reason: "expected value".into(),
        };
        assert!(err.to_string().contains("user"));

        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(StoreError::from(json_err), StoreError::Serialization(_)));
    }
}
