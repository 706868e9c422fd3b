//! # Change History
//!
//! Every state mutation appends one [`StateChange`]. The log is bounded and
//! evicts its oldest entries first.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One recorded mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateChange {
    /// The key that changed.
    pub key: String,

    /// Value before the change (`None` if the key was absent).
    pub old_value: Option<Value>,

    /// Value after the change (`None` if the key was removed).
    pub new_value: Option<Value>,

    /// When the change happened.
    pub timestamp: DateTime<Utc>,
}

/// Bounded FIFO of state changes.
#[derive(Debug, Clone)]
pub(crate) struct ChangeLog {
    entries: VecDeque<StateChange>,
    capacity: usize,
}

impl ChangeLog {
    pub(crate) fn new(capacity: usize) -> Self {
        ChangeLog {
            entries: VecDeque::with_capacity(capacity.min(64)),
            capacity: capacity.max(1),
        }
    }

    pub(crate) fn record(&mut self, key: &str, old_value: Option<Value>, new_value: Option<Value>) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(StateChange {
            key: key.to_string(),
            old_value,
            new_value,
            timestamp: Utc::now(),
        });
    }

    pub(crate) fn entries(&self, key: Option<&str>) -> Vec<StateChange> {
        self.entries
            .iter()
            .filter(|e| key.map_or(true, |k| e.key == k))
            .cloned()
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_oldest_entries_are_evicted() {
        let mut log = ChangeLog::new(3);
        for i in 0..5 {
            log.record("counter", Some(json!(i)), Some(json!(i + 1)));
        }

        let entries = log.entries(None);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].new_value, Some(json!(3)));
        assert_eq!(entries[2].new_value, Some(json!(5)));
    }

    #[test]
    fn test_filter_by_key() {
        let mut log = ChangeLog::new(10);
        log.record("theme", None, Some(json!("dark")));
        log.record("user", None, Some(json!({"id": 1})));

        assert_eq!(log.entries(Some("theme")).len(), 1);
        assert_eq!(log.len(), 2);
    }
}
