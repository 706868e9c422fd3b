//! # Error Types
//!
//! Shared error types for till-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  till-core errors (this file)                                          │
//! │  ├── CoreError        - Umbrella for pure-logic failures               │
//! │  ├── PatternError     - Malformed route patterns (configuration)       │
//! │  └── ValidationError  - Field-level form validation failures           │
//! │                                                                         │
//! │  till-store  → StoreError   (storage backends, serialization)          │
//! │  till-router → RouterError  (patterns, middleware, handlers)           │
//! │  till-view   → ViewError    (lifecycle, render, API)                   │
//! │                                                                         │
//! │  Flow: PatternError → RouterError → error handler → shell fallback     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Umbrella error for till-core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A route pattern could not be compiled.
    #[error("Invalid route pattern: {0}")]
    Pattern(#[from] PatternError),

    /// A field failed validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Pattern Error
// =============================================================================

/// Route pattern compilation failures.
///
/// These are configuration errors: they surface at `add_route` time so a
/// broken route table never reaches the first navigation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// Pattern string is empty.
    #[error("route pattern is empty")]
    Empty,

    /// Pattern does not start with `/`.
    #[error("route pattern '{0}' must start with '/'")]
    MissingLeadingSlash(String),

    /// A `:` segment has no usable parameter name.
    #[error("route pattern '{pattern}' has an invalid parameter name at byte {position}")]
    InvalidParamName { pattern: String, position: usize },

    /// The same parameter name appears twice.
    #[error("route pattern '{pattern}' declares parameter '{name}' more than once")]
    DuplicateParam { pattern: String, name: String },

    /// More than one `*` wildcard.
    #[error("route pattern '{0}' may contain at most one '*' wildcard")]
    MultipleWildcards(String),

    /// The generated matcher failed to compile.
    #[error("route pattern '{pattern}' failed to compile: {reason}")]
    Regex { pattern: String, reason: String },
}

// =============================================================================
// Validation Error
// =============================================================================

/// Field-level validation errors.
///
/// One of these is attached to each failing form field; the first failing
/// rule wins.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Field value does not match the configured pattern.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A custom validator rejected the value.
    #[error("{message}")]
    Custom { field: String, message: String },
}

impl ValidationError {
    /// Name of the field this error is attached to.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooShort { field, .. }
            | ValidationError::TooLong { field, .. }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::Custom { field, .. } => field,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "username".to_string(),
        };
        assert_eq!(err.to_string(), "username is required");

        let err = ValidationError::TooShort {
            field: "password".to_string(),
            min: 6,
        };
        assert_eq!(err.to_string(), "password must be at least 6 characters");
        assert_eq!(err.field(), "password");
    }

    #[test]
    fn test_pattern_error_converts_to_core_error() {
        let core_err: CoreError = PatternError::Empty.into();
        assert!(matches!(core_err, CoreError::Pattern(PatternError::Empty)));
    }
}
