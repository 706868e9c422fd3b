//! # Store Configuration
//!
//! Which keys are persisted, which are sensitive, and how big the history is.
//!
//! ## Configuration File Format
//! This struct is the `[storage]` table of the shell's `till.toml`:
//! ```toml
//! [storage]
//! backend = "sqlite"
//! prefix = "till."
//! persisted_keys = ["user", "token", "theme", "settings"]
//! sensitive_keys = ["user", "token", "cart", "currentSale"]
//! history_limit = 50
//! validation_policy = "warn"
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use till_core::{DEFAULT_LOG_CAPACITY, DEFAULT_SENSITIVE_KEYS};

use crate::error::{StoreError, StoreResult};

/// What happens when a validator rejects a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationPolicy {
    /// Log a warning and keep the value.
    #[default]
    Warn,

    /// Log a warning and reject the write before anything changes.
    Revert,
}

/// StateManager configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Keys written through to durable storage on every mutation.
    #[serde(default = "default_persisted_keys")]
    pub persisted_keys: BTreeSet<String>,

    /// Keys removed by `clear_sensitive_data`.
    #[serde(default = "default_sensitive_keys")]
    pub sensitive_keys: BTreeSet<String>,

    /// Maximum number of retained history entries.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Prefix applied to keys in durable storage.
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Validator failure behavior.
    #[serde(default)]
    pub validation_policy: ValidationPolicy,
}

fn default_persisted_keys() -> BTreeSet<String> {
    ["user", "token", "theme", "settings"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_sensitive_keys() -> BTreeSet<String> {
    DEFAULT_SENSITIVE_KEYS.into_iter().map(String::from).collect()
}

fn default_history_limit() -> usize {
    DEFAULT_LOG_CAPACITY
}

fn default_prefix() -> String {
    "till.".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            persisted_keys: default_persisted_keys(),
            sensitive_keys: default_sensitive_keys(),
            history_limit: default_history_limit(),
            prefix: default_prefix(),
            validation_policy: ValidationPolicy::default(),
        }
    }
}

impl StoreConfig {
    /// Replaces the persisted key set.
    pub fn persisted<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.persisted_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the sensitive key set.
    pub fn sensitive<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sensitive_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the validator failure policy.
    pub fn validation_policy(mut self, policy: ValidationPolicy) -> Self {
        self.validation_policy = policy;
        self
    }

    /// True if `key` is written through to storage.
    pub fn is_persisted(&self, key: &str) -> bool {
        self.persisted_keys.contains(key)
    }

    /// True if `key` is cleared by `clear_sensitive_data`.
    pub fn is_sensitive(&self, key: &str) -> bool {
        self.sensitive_keys.contains(key)
    }

    /// Storage key for a state key.
    pub fn storage_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> StoreResult<()> {
        if self.history_limit == 0 {
            return Err(StoreError::InvalidConfig(
                "history_limit must be greater than 0".into(),
            ));
        }
        if self.persisted_keys.iter().any(|k| k.trim().is_empty()) {
            return Err(StoreError::InvalidConfig(
                "persisted_keys must not contain empty keys".into(),
            ));
        }
        Ok(())
    }
}
