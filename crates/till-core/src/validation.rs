//! # Form Validation
//!
//! Declarative per-field rules shared by every form-bearing view.
//!
//! ## Evaluation Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  For each field (in declaration order):                                 │
//! │                                                                         │
//! │    required ──► min_length ──► max_length ──► pattern ──► custom        │
//! │        │             │              │            │           │          │
//! │        └─────────────┴──────────────┴────────────┴───────────┘          │
//! │                  first failure wins, later rules are skipped            │
//! │                                                                         │
//! │  An empty, non-required field passes without running other rules.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use std::collections::HashMap;
//! use till_core::validation::{FieldRules, FormValidator};
//!
//! let form = FormValidator::new()
//!     .field("username", FieldRules::new().required().min_length(3))
//!     .field("pin", FieldRules::new().pattern(r"^\d{4}$", "must be 4 digits").unwrap());
//!
//! let mut values = HashMap::new();
//! values.insert("username".to_string(), "al".to_string());
//! values.insert("pin".to_string(), "12a4".to_string());
//!
//! let report = form.validate(&values);
//! assert!(!report.is_valid());
//! assert_eq!(report.errors().len(), 2);
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::error::{PatternError, ValidationError};

/// Custom validator: `Err(message)` rejects the value.
pub type CustomRule = Arc<dyn Fn(&str) -> Result<(), String> + Send + Sync>;

/// Rules for a single field.
#[derive(Clone, Default)]
pub struct FieldRules {
    required: bool,
    min_length: Option<usize>,
    max_length: Option<usize>,
    pattern: Option<(Regex, String)>,
    custom: Option<CustomRule>,
}

impl FieldRules {
    /// Creates an empty rule set (everything passes).
    pub fn new() -> Self {
        Self::default()
    }

    /// The field must be present and not blank.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Minimum length in characters.
    pub fn min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    /// Maximum length in characters.
    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    /// The value must match `expr`; `reason` is shown on failure.
    pub fn pattern(mut self, expr: &str, reason: impl Into<String>) -> Result<Self, PatternError> {
        let regex = Regex::new(expr).map_err(|e| PatternError::Regex {
            pattern: expr.to_string(),
            reason: e.to_string(),
        })?;
        self.pattern = Some((regex, reason.into()));
        Ok(self)
    }

    /// Adds a custom validator, evaluated last.
    pub fn custom<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> Result<(), String> + Send + Sync + 'static,
    {
        self.custom = Some(Arc::new(f));
        self
    }

    /// Checks a single value against the rules.
    pub fn check(&self, field: &str, value: Option<&str>) -> Result<(), ValidationError> {
        let value = value.unwrap_or_default();

        if value.trim().is_empty() {
            if self.required {
                return Err(ValidationError::Required {
                    field: field.to_string(),
                });
            }
            return Ok(());
        }

        let len = value.chars().count();

        if let Some(min) = self.min_length {
            if len < min {
                return Err(ValidationError::TooShort {
                    field: field.to_string(),
                    min,
                });
            }
        }

        if let Some(max) = self.max_length {
            if len > max {
                return Err(ValidationError::TooLong {
                    field: field.to_string(),
                    max,
                });
            }
        }

        if let Some((regex, reason)) = &self.pattern {
            if !regex.is_match(value) {
                return Err(ValidationError::InvalidFormat {
                    field: field.to_string(),
                    reason: reason.clone(),
                });
            }
        }

        if let Some(custom) = &self.custom {
            custom(value).map_err(|message| ValidationError::Custom {
                field: field.to_string(),
                message,
            })?;
        }

        Ok(())
    }
}

impl fmt::Debug for FieldRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldRules")
            .field("required", &self.required)
            .field("min_length", &self.min_length)
            .field("max_length", &self.max_length)
            .field("pattern", &self.pattern.as_ref().map(|(r, _)| r.as_str()))
            .field("custom", &self.custom.is_some())
            .finish()
    }
}

/// An ordered set of field rules for one form.
#[derive(Debug, Clone, Default)]
pub struct FormValidator {
    fields: Vec<(String, FieldRules)>,
}

impl FormValidator {
    /// Creates an empty form validator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds rules for a field.
    pub fn field(mut self, name: impl Into<String>, rules: FieldRules) -> Self {
        self.fields.push((name.into(), rules));
        self
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Validates every field, collecting at most one error per field.
    pub fn validate(&self, values: &HashMap<String, String>) -> ValidationReport {
        let errors = self
            .fields
            .iter()
            .filter_map(|(name, rules)| {
                rules
                    .check(name, values.get(name).map(String::as_str))
                    .err()
                    .map(|err| (name.clone(), err))
            })
            .collect();

        ValidationReport { errors }
    }
}

/// Outcome of a form validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    errors: BTreeMap<String, ValidationError>,
}

impl ValidationReport {
    /// True when no field failed.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Field-level errors keyed by field name.
    pub fn errors(&self) -> &BTreeMap<String, ValidationError> {
        &self.errors
    }

    /// The error attached to `field`, if any.
    pub fn error_for(&self, field: &str) -> Option<&ValidationError> {
        self.errors.get(field)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_required() {
        let rules = FieldRules::new().required();
        assert!(matches!(
            rules.check("username", None),
            Err(ValidationError::Required { .. })
        ));
        assert!(rules.check("username", Some("   ")).is_err());
        assert!(rules.check("username", Some("ana")).is_ok());
    }

    #[test]
    fn test_rules_short_circuit_in_fixed_order() {
        let rules = FieldRules::new()
            .required()
            .min_length(4)
            .max_length(8)
            .pattern(r"^[a-z]+$", "lowercase letters only")
            .unwrap()
            .custom(|_| Err("never reached for short values".into()));

        // too short AND wrong pattern: min_length reported
        assert!(matches!(
            rules.check("name", Some("A1")),
            Err(ValidationError::TooShort { min: 4, .. })
        ));

        // right length, wrong pattern: pattern reported before custom
        assert!(matches!(
            rules.check("name", Some("ABCDE")),
            Err(ValidationError::InvalidFormat { .. })
        ));

        // every built-in passes: custom runs
        assert!(matches!(
            rules.check("name", Some("abcde")),
            Err(ValidationError::Custom { .. })
        ));
    }

    #[test]
    fn test_optional_empty_field_skips_other_rules() {
        let rules = FieldRules::new().min_length(3);
        assert!(rules.check("notes", None).is_ok());
        assert!(rules.check("notes", Some("")).is_ok());
        assert!(rules.check("notes", Some("ab")).is_err());
    }

    #[test]
    fn test_form_report() {
        let form = FormValidator::new()
            .field("username", FieldRules::new().required())
            .field("password", FieldRules::new().required().min_length(6));

        let report = form.validate(&values(&[("username", "ana"), ("password", "123")]));
        assert!(!report.is_valid());
        assert!(report.error_for("username").is_none());
        assert_eq!(
            report.error_for("password").map(|e| e.to_string()),
            Some("password must be at least 6 characters".to_string())
        );

        let report = form.validate(&values(&[("username", "ana"), ("password", "123456")]));
        assert!(report.is_valid());
    }

    #[test]
    fn test_length_counts_characters() {
        let rules = FieldRules::new().max_length(4);
        assert!(rules.check("name", Some("café")).is_ok());
    }
}
