//! # till-core: Pure Building Blocks for the Till POS Shell
//!
//! This crate holds the logic every other crate in the workspace leans on,
//! written as pure functions with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Till POS Shell Architecture                       │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    apps/till-shell                              │   │
//! │  │     Login ──► Dashboard ──► POS ──► Products                    │   │
//! │  └───────────┬──────────────────┬──────────────────┬───────────────┘   │
//! │              │                  │                  │                    │
//! │  ┌───────────▼─────┐  ┌─────────▼───────┐  ┌──────▼──────────┐        │
//! │  │  till-router    │  │  till-store     │  │  till-view      │        │
//! │  │  navigation     │  │  StateManager   │  │  BaseView       │        │
//! │  └───────────┬─────┘  └─────────┬───────┘  └──────┬──────────┘        │
//! │              └──────────────────┼─────────────────┘                    │
//! │  ┌──────────────────────────────▼──────────────────────────────────┐   │
//! │  │               ★ till-core (THIS CRATE) ★                         │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   path    │  │  pattern  │  │ validation│  │  chrome   │  │   │
//! │  │   │ normalize │  │ :id and * │  │ FieldRules│  │ title +   │  │   │
//! │  │   │ query     │  │ matchers  │  │ per field │  │ class     │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO STORAGE • NO TIMERS • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`path`] - Path normalization and query-string splitting
//! - [`pattern`] - Route pattern compiler (`/products/:id`, `/files/*`)
//! - [`value`] - Structural equality for state values
//! - [`validation`] - Declarative per-field form rules
//! - [`chrome`] - Page chrome capability (title, marker classes)
//! - [`error`] - Shared error types
//!
//! ## Example Usage
//!
//! ```rust
//! use till_core::pattern::RoutePattern;
//!
//! let pattern = RoutePattern::compile("/products/:id").unwrap();
//! let params = pattern.match_path("/products/42").unwrap();
//! assert_eq!(params.get("id").map(String::as_str), Some("42"));
//! assert!(pattern.match_path("/products/42/edit").is_none());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod chrome;
pub mod error;
pub mod path;
pub mod pattern;
pub mod validation;
pub mod value;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use chrome::{Chrome, NoopChrome, RecordingChrome};
pub use error::{CoreError, CoreResult, PatternError, ValidationError};
pub use path::{normalize_path, parse_query, split_query, QueryParams};
pub use pattern::{RouteParams, RoutePattern, WILDCARD_PARAM};
pub use validation::{FieldRules, FormValidator, ValidationReport};
pub use value::structurally_equal;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Capacity of the router's internal navigation log and the state history.
///
/// Oldest entries are evicted first once the cap is reached.
pub const DEFAULT_LOG_CAPACITY: usize = 50;

/// State keys cleared in bulk on logout.
pub const DEFAULT_SENSITIVE_KEYS: [&str; 4] = ["user", "token", "cart", "currentSale"];
