//! # State Manager
//!
//! The single shared mutable resource of the shell.
//!
//! ## Mutation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      set_state("user", value)                           │
//! │                                                                         │
//! │  1. Validators ─────────── invalid? warn (Revert policy: reject here)   │
//! │        │                                                                │
//! │  2. Lock state ─────────── structurally equal? ──► return false         │
//! │        │                                                                │
//! │  3. Replace value + append history entry, take snapshot, UNLOCK         │
//! │        │                                                                │
//! │  4. "user" subscribers ─── (new, old), in subscription order            │
//! │        │                                                                │
//! │  5. Wildcard subscribers ─ (key, new, old, snapshot)                    │
//! │        │                                                                │
//! │  6. Persisted key? ─────── write through to Storage                     │
//! │        │                                                                │
//! │  7. Computed keys depending on "user" are recomputed                    │
//! │                                                                         │
//! │  No lock is held while subscribers run, so a subscriber may write       │
//! │  OTHER keys. Writing the same key from its own subscriber recurses.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Failure Isolation
//! A panicking subscriber is caught and logged; the remaining subscribers
//! still run. Storage failures during write-through are logged and never
//! cross the `set_state` boundary.

use std::collections::{BTreeMap, HashMap};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use till_core::structurally_equal;
use tracing::{debug, error, warn};

use crate::config::{StoreConfig, ValidationPolicy};
use crate::error::{StoreError, StoreResult};
use crate::history::{ChangeLog, StateChange};
use crate::storage::{MemoryStorage, Storage};
use crate::subscription::{KeyCallback, Registry, Subscription, Topic, WildcardCallback};

/// Full copy of the state, passed to wildcard subscribers.
pub type StateSnapshot = BTreeMap<String, Value>;

/// Validator attached to a key: `Err(reason)` marks the value invalid.
pub type Validator = Arc<dyn Fn(&Value) -> Result<(), String> + Send + Sync>;

/// Compute function of a derived key.
pub type ComputeFn = Arc<dyn Fn(&StateSnapshot) -> Result<Value, String> + Send + Sync>;

struct Inner {
    values: StateSnapshot,
    history: ChangeLog,
}

#[derive(Clone)]
struct Computed {
    key: String,
    deps: Vec<String>,
    compute: ComputeFn,
}

/// One removal or write that still has to be announced.
struct Pending {
    key: String,
    old: Option<Value>,
    new: Option<Value>,
}

/// Pub/sub key/value store with history and persistence.
pub struct StateManager {
    config: StoreConfig,
    storage: Arc<dyn Storage>,
    inner: Mutex<Inner>,
    registry: Arc<Mutex<Registry>>,
    validators: Mutex<HashMap<String, Vec<Validator>>>,
    computed: Mutex<Vec<Computed>>,
}

impl StateManager {
    /// Creates a store and loads every persisted key from `storage`.
    pub fn new(config: StoreConfig, storage: Arc<dyn Storage>) -> Self {
        let history = ChangeLog::new(config.history_limit);
        let manager = StateManager {
            config,
            storage,
            inner: Mutex::new(Inner {
                values: StateSnapshot::new(),
                history,
            }),
            registry: Arc::new(Mutex::new(Registry::default())),
            validators: Mutex::new(HashMap::new()),
            computed: Mutex::new(Vec::new()),
        };
        manager.load_persisted();
        manager
    }

    /// Creates a store with default configuration over fresh in-memory storage.
    pub fn in_memory() -> Self {
        Self::new(StoreConfig::default(), Arc::new(MemoryStorage::new()))
    }

    /// The store configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Returns a clone of the value for `key`.
    pub fn get_state(&self, key: &str) -> Option<Value> {
        self.inner.lock().values.get(key).cloned()
    }

    /// Returns the value for `key`, or `default` if absent.
    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.get_state(key).unwrap_or(default)
    }

    /// Deserializes the value for `key`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        self.get_state(key)
            .map(serde_json::from_value)
            .transpose()
            .map_err(StoreError::from)
    }

    /// True if `key` currently has a value.
    pub fn has_state(&self, key: &str) -> bool {
        self.inner.lock().values.contains_key(key)
    }

    /// Keys currently present, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.inner.lock().values.keys().cloned().collect()
    }

    /// Copy of the whole state.
    pub fn snapshot(&self) -> StateSnapshot {
        self.inner.lock().values.clone()
    }

    /// Reads a key straight from durable storage, bypassing state.
    ///
    /// Missing, unreadable or corrupt entries yield `default`.
    pub fn read_persisted(&self, key: &str, default: Value) -> Value {
        match self.storage.get(&self.config.storage_key(key)) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(key, error = %e, "Persisted value is corrupt, using default");
                default
            }),
            Ok(None) => default,
            Err(e) => {
                error!(key, error = %e, "Failed to read persisted value");
                default
            }
        }
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Sets `key` to `value`.
    ///
    /// Returns `false` when nothing changed (structurally equal value, or the
    /// write was rejected by a validator under [`ValidationPolicy::Revert`]).
    pub fn set_state(&self, key: &str, value: Value) -> bool {
        if !self.passes_validation(key, &value) {
            return false;
        }

        let (old, snapshot) = {
            let mut inner = self.inner.lock();
            if let Some(existing) = inner.values.get(key) {
                if structurally_equal(existing, &value) {
                    return false;
                }
            }
            let old = inner.values.insert(key.to_string(), value.clone());
            inner.history.record(key, old.clone(), Some(value.clone()));
            (old, inner.values.clone())
        };

        debug!(key, "State updated");
        self.notify(key, Some(&value), old.as_ref(), &snapshot);
        self.persist(key, Some(&value));
        self.recompute(&[key.to_string()]);
        true
    }

    /// Serializes `value` and stores it under `key`.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> StoreResult<bool> {
        let value = serde_json::to_value(value)?;
        Ok(self.set_state(key, value))
    }

    /// Removes `key`, notifying subscribers with `None`.
    ///
    /// Returns the removed value.
    pub fn remove_state(&self, key: &str) -> Option<Value> {
        let (old, snapshot) = {
            let mut inner = self.inner.lock();
            let old = inner.values.remove(key)?;
            inner.history.record(key, Some(old.clone()), None);
            (old, inner.values.clone())
        };

        debug!(key, "State removed");
        self.notify(key, None, Some(&old), &snapshot);
        self.persist(key, None);
        self.recompute(&[key.to_string()]);
        Some(old)
    }

    /// Applies several writes at once.
    ///
    /// Old values are captured and every mutation applied before the first
    /// subscriber runs, so wildcard subscribers see all batched keys updated.
    /// Later duplicates of a key win. Returns the keys that actually changed.
    pub fn batch_update<I, K>(&self, entries: I) -> Vec<String>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut ordered: Vec<(String, Value)> = Vec::new();
        for (key, value) in entries {
            let key = key.into();
            match ordered.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = value,
                None => ordered.push((key, value)),
            }
        }
        ordered.retain(|(key, value)| self.passes_validation(key, value));

        let (pending, snapshot) = {
            let mut inner = self.inner.lock();

            let olds: Vec<Option<Value>> = ordered
                .iter()
                .map(|(key, _)| inner.values.get(key).cloned())
                .collect();

            let mut pending = Vec::new();
            for ((key, value), old) in ordered.into_iter().zip(olds) {
                if old
                    .as_ref()
                    .is_some_and(|existing| structurally_equal(existing, &value))
                {
                    continue;
                }
                inner.values.insert(key.clone(), value.clone());
                inner.history.record(&key, old.clone(), Some(value.clone()));
                pending.push(Pending {
                    key,
                    old,
                    new: Some(value),
                });
            }
            (pending, inner.values.clone())
        };

        if pending.is_empty() {
            return Vec::new();
        }
        debug!(count = pending.len(), "Batch update applied");

        for change in &pending {
            self.notify(&change.key, change.new.as_ref(), change.old.as_ref(), &snapshot);
        }
        for change in &pending {
            self.persist(&change.key, change.new.as_ref());
        }

        let changed: Vec<String> = pending.into_iter().map(|c| c.key).collect();
        self.recompute(&changed);
        changed
    }

    /// Removes every sensitive key that is present.
    ///
    /// Also purges durable copies of sensitive keys that were not loaded.
    pub fn clear_sensitive_data(&self) {
        let keys: Vec<String> = self.config.sensitive_keys.iter().cloned().collect();
        for key in &keys {
            if self.remove_state(key).is_none() && self.config.is_persisted(key) {
                self.persist(key, None);
            }
        }
        debug!(keys = ?keys, "Sensitive data cleared");
    }

    /// Removes every key except `keys_to_keep`.
    pub fn reset(&self, keys_to_keep: &[&str]) {
        let doomed: Vec<String> = self
            .keys()
            .into_iter()
            .filter(|key| !keys_to_keep.contains(&key.as_str()))
            .collect();

        for key in &doomed {
            self.remove_state(key);
        }
        debug!(removed = doomed.len(), kept = keys_to_keep.len(), "State reset");
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Subscribes to changes of `key`.
    ///
    /// If the key already has a value the callback runs immediately with
    /// `(Some(current), None)`.
    pub fn subscribe<F>(&self, key: &str, callback: F) -> Subscription
    where
        F: Fn(Option<&Value>, Option<&Value>) + Send + Sync + 'static,
    {
        let callback: KeyCallback = Arc::new(callback);
        let id = self.registry.lock().add_key(key, callback.clone());

        if let Some(current) = self.get_state(key) {
            if catch_unwind(AssertUnwindSafe(|| callback(Some(&current), None))).is_err() {
                error!(key, "Subscriber panicked during initial sync");
            }
        }

        Subscription::new(id, Topic::Key(key.to_string()), &self.registry)
    }

    /// Subscribes to every change.
    pub fn subscribe_all<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&str, Option<&Value>, Option<&Value>, &StateSnapshot) + Send + Sync + 'static,
    {
        let callback: WildcardCallback = Arc::new(callback);
        let id = self.registry.lock().add_wildcard(callback);
        Subscription::new(id, Topic::All, &self.registry)
    }

    /// Number of live subscribers for `key` (wildcards excluded).
    pub fn subscriber_count(&self, key: &str) -> usize {
        self.registry.lock().count(key)
    }

    // =========================================================================
    // History
    // =========================================================================

    /// Recorded changes, oldest first, optionally filtered by key.
    pub fn history(&self, key: Option<&str>) -> Vec<StateChange> {
        self.inner.lock().history.entries(key)
    }

    /// Number of recorded changes.
    pub fn history_len(&self) -> usize {
        self.inner.lock().history.len()
    }

    /// Drops all recorded changes.
    pub fn clear_history(&self) {
        self.inner.lock().history.clear();
    }

    // =========================================================================
    // Validators & Computed Keys
    // =========================================================================

    /// Attaches a validator to `key`.
    pub fn add_validator<F>(&self, key: &str, validator: F)
    where
        F: Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validators
            .lock()
            .entry(key.to_string())
            .or_default()
            .push(Arc::new(validator));
    }

    /// Declares `key` as derived from `deps`.
    ///
    /// The value is computed now and again whenever a dependency changes.
    /// A failing compute logs the error and leaves `key` unset.
    pub fn computed<F>(&self, key: &str, deps: &[&str], compute: F)
    where
        F: Fn(&StateSnapshot) -> Result<Value, String> + Send + Sync + 'static,
    {
        let def = Computed {
            key: key.to_string(),
            deps: deps.iter().map(|d| d.to_string()).collect(),
            compute: Arc::new(compute),
        };
        self.computed.lock().push(def.clone());
        self.evaluate(&def);
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn passes_validation(&self, key: &str, value: &Value) -> bool {
        let validators = match self.validators.lock().get(key) {
            Some(list) => list.clone(),
            None => return true,
        };

        let failure = validators.iter().find_map(|validate| validate(value).err());
        match failure {
            None => true,
            Some(reason) => match self.config.validation_policy {
                ValidationPolicy::Warn => {
                    warn!(key, %reason, "State value failed validation");
                    true
                }
                ValidationPolicy::Revert => {
                    warn!(key, %reason, "State value failed validation, write rejected");
                    false
                }
            },
        }
    }

    fn notify(&self, key: &str, new: Option<&Value>, old: Option<&Value>, snapshot: &StateSnapshot) {
        let (keyed, wildcard) = self.registry.lock().listeners(key);

        for callback in keyed {
            if catch_unwind(AssertUnwindSafe(|| callback(new, old))).is_err() {
                error!(key, "State subscriber panicked");
            }
        }
        for callback in wildcard {
            if catch_unwind(AssertUnwindSafe(|| callback(key, new, old, snapshot))).is_err() {
                error!(key, "Wildcard state subscriber panicked");
            }
        }
    }

    fn persist(&self, key: &str, value: Option<&Value>) {
        if !self.config.is_persisted(key) {
            return;
        }

        let storage_key = self.config.storage_key(key);
        let result = match value {
            Some(value) => serde_json::to_string(value)
                .map_err(StoreError::from)
                .and_then(|raw| self.storage.set(&storage_key, &raw)),
            None => self.storage.remove(&storage_key),
        };

        if let Err(e) = result {
            error!(key, error = %e, "Failed to write persisted state");
        }
    }

    fn load_persisted(&self) {
        let mut loaded = 0usize;
        for key in &self.config.persisted_keys {
            let storage_key = self.config.storage_key(key);
            match self.storage.get(&storage_key) {
                Ok(Some(raw)) => match serde_json::from_str::<Value>(&raw) {
                    Ok(value) => {
                        self.inner.lock().values.insert(key.clone(), value);
                        loaded += 1;
                    }
                    Err(e) => {
                        let err = StoreError::Corrupt {
                            key: key.clone(),
                            reason: e.to_string(),
                        };
                        warn!(error = %err, "Skipping persisted key");
                    }
                },
                Ok(None) => {}
                Err(e) => error!(key = %key, error = %e, "Failed to load persisted key"),
            }
        }
        debug!(loaded, "Persisted state loaded");
    }

    fn recompute(&self, changed: &[String]) {
        let affected: Vec<Computed> = self
            .computed
            .lock()
            .iter()
            .filter(|def| !changed.contains(&def.key))
            .filter(|def| def.deps.iter().any(|dep| changed.contains(dep)))
            .cloned()
            .collect();

        for def in &affected {
            self.evaluate(def);
        }
    }

    fn evaluate(&self, def: &Computed) {
        let snapshot = self.snapshot();
        match catch_unwind(AssertUnwindSafe(|| (def.compute)(&snapshot))) {
            Ok(Ok(value)) => {
                self.set_state(&def.key, value);
            }
            Ok(Err(reason)) => {
                error!(key = %def.key, %reason, "Computed value failed");
                self.remove_state(&def.key);
            }
            Err(_) => {
                error!(key = %def.key, "Computed value panicked");
                self.remove_state(&def.key);
            }
        }
    }
}

impl std::fmt::Debug for StateManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateManager")
            .field("keys", &self.keys())
            .field("history_len", &self.history_len())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn store() -> StateManager {
        StateManager::in_memory()
    }

    #[test]
    fn test_equal_value_is_a_no_op() {
        let store = store();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let _sub = store.subscribe("user", move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(store.set_state("user", json!({"id": 1})));
        assert!(!store.set_state("user", json!({"id": 1})));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.history(Some("user")).len(), 1);
    }

    #[test]
    fn test_subscribers_receive_new_and_old() {
        let store = store();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        let _sub = store.subscribe("theme", move |new, old| {
            log.lock().push((new.cloned(), old.cloned()));
        });

        store.set_state("theme", json!("light"));
        store.set_state("theme", json!("dark"));

        let seen = seen.lock();
        assert_eq!(seen[0], (Some(json!("light")), None));
        assert_eq!(seen[1], (Some(json!("dark")), Some(json!("light"))));
    }

    #[test]
    fn test_subscribe_syncs_to_current_value() {
        let store = store();
        store.set_state("theme", json!("dark"));

        let seen = Arc::new(Mutex::new(None));
        let slot = seen.clone();
        let _sub = store.subscribe("theme", move |new, old| {
            *slot.lock() = Some((new.cloned(), old.cloned()));
        });

        assert_eq!(*seen.lock(), Some((Some(json!("dark")), None)));
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let store = store();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let sub = store.subscribe("cart", move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        sub.unsubscribe();
        sub.unsubscribe();
        assert!(!sub.is_active());
        assert_eq!(store.subscriber_count("cart"), 0);

        store.set_state("cart", json!([]));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_panicking_subscriber_does_not_stop_others() {
        let store = store();
        let calls = Arc::new(AtomicUsize::new(0));

        let _bad = store.subscribe("theme", |_, _| panic!("subscriber bug"));
        let counter = calls.clone();
        let _good = store.subscribe("theme", move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(store.set_state("theme", json!("dark")));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_wildcard_subscriber_gets_snapshot() {
        let store = store();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        let _sub = store.subscribe_all(move |key, new, _old, snapshot| {
            log.lock()
                .push((key.to_string(), new.cloned(), snapshot.len()));
        });

        store.set_state("a", json!(1));
        store.set_state("b", json!(2));

        let seen = seen.lock();
        assert_eq!(seen[0], ("a".to_string(), Some(json!(1)), 1));
        assert_eq!(seen[1], ("b".to_string(), Some(json!(2)), 2));
    }

    #[test]
    fn test_key_subscribers_run_before_wildcards() {
        let store = store();
        let order = Arc::new(Mutex::new(Vec::new()));

        let log = order.clone();
        let _all = store.subscribe_all(move |_, _, _, _| log.lock().push("wildcard"));
        let log = order.clone();
        let _key = store.subscribe("theme", move |_, _| log.lock().push("key"));

        store.set_state("theme", json!("dark"));
        assert_eq!(*order.lock(), vec!["key", "wildcard"]);
    }

    #[test]
    fn test_batch_update_snapshot_contains_all_keys() {
        let store = store();
        store.set_state("subtotal", json!(0));

        let snapshots = Arc::new(Mutex::new(Vec::new()));
        let log = snapshots.clone();
        let _sub = store.subscribe_all(move |key, _, _, snapshot| {
            log.lock().push((key.to_string(), snapshot.clone()));
        });

        let changed = store.batch_update([
            ("subtotal", json!(1000)),
            ("tax", json!(83)),
            ("total", json!(1083)),
        ]);
        assert_eq!(changed, vec!["subtotal", "tax", "total"]);

        let snapshots = snapshots.lock();
        assert_eq!(snapshots.len(), 3);
        for (_, snapshot) in snapshots.iter() {
            assert_eq!(snapshot.get("subtotal"), Some(&json!(1000)));
            assert_eq!(snapshot.get("tax"), Some(&json!(83)));
            assert_eq!(snapshot.get("total"), Some(&json!(1083)));
        }
    }

    #[test]
    fn test_batch_update_skips_equal_values() {
        let store = store();
        store.set_state("theme", json!("dark"));
        let before = store.history_len();

        let changed = store.batch_update([("theme", json!("dark")), ("lang", json!("en"))]);
        assert_eq!(changed, vec!["lang"]);
        assert_eq!(store.history_len(), before + 1);
    }

    #[test]
    fn test_clear_sensitive_data() {
        let store = store();
        store.set_state("token", json!("abc"));
        store.set_state("theme", json!("dark"));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        let _sub = store.subscribe("token", move |new, _| log.lock().push(new.cloned()));

        store.clear_sensitive_data();

        assert!(!store.has_state("token"));
        assert_eq!(store.get_state("theme"), Some(json!("dark")));
        // initial sync, then removal
        assert_eq!(*seen.lock(), vec![Some(json!("abc")), None]);
    }

    #[test]
    fn test_reset_keeps_listed_keys() {
        let store = store();
        store.batch_update([("theme", json!("dark")), ("cart", json!([])), ("lang", json!("en"))]);

        store.reset(&["theme"]);
        assert_eq!(store.keys(), vec!["theme"]);
    }

    #[test]
    fn test_history_is_bounded() {
        let store = store();
        for i in 0..60 {
            store.set_state("counter", json!(i));
        }
        let history = store.history(None);
        assert_eq!(history.len(), 50);
        assert_eq!(history[0].new_value, Some(json!(10)));
    }

    #[test]
    fn test_persisted_round_trip() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());

        let first = StateManager::new(StoreConfig::default(), storage.clone());
        first.set_state("theme", json!("dark"));
        first.set_state("cart", json!([{"sku": "COKE"}])); // not persisted

        let second = StateManager::new(StoreConfig::default(), storage);
        assert_eq!(second.get_state("theme"), Some(json!("dark")));
        assert!(!second.has_state("cart"));
    }

    #[test]
    fn test_clear_sensitive_purges_storage() {
        let storage = Arc::new(MemoryStorage::new());
        let store = StateManager::new(StoreConfig::default(), storage.clone());
        store.set_state("token", json!("abc"));
        assert!(storage.get("till.token").unwrap().is_some());

        store.clear_sensitive_data();
        assert!(storage.get("till.token").unwrap().is_none());
    }

    #[test]
    fn test_corrupt_persisted_value_is_skipped() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set("till.theme", "{not json").unwrap();
        storage.set("till.user", r#"{"id":1}"#).unwrap();

        let store = StateManager::new(StoreConfig::default(), storage);
        assert!(!store.has_state("theme"));
        assert_eq!(store.get_state("user"), Some(json!({"id": 1})));
        assert_eq!(store.read_persisted("theme", json!("light")), json!("light"));
        assert_eq!(store.read_persisted("missing", json!(0)), json!(0));
    }

    #[test]
    fn test_validator_warn_keeps_value() {
        let store = store();
        store.add_validator("qty", |v| {
            if v.as_i64().is_some_and(|n| n > 0) {
                Ok(())
            } else {
                Err("quantity must be positive".into())
            }
        });

        assert!(store.set_state("qty", json!(-1)));
        assert_eq!(store.get_state("qty"), Some(json!(-1)));
    }

    #[test]
    fn test_validator_revert_rejects_value() {
        let config = StoreConfig::default().validation_policy(ValidationPolicy::Revert);
        let store = StateManager::new(config, Arc::new(MemoryStorage::new()));
        store.add_validator("qty", |v| {
            if v.as_i64().is_some_and(|n| n > 0) {
                Ok(())
            } else {
                Err("quantity must be positive".into())
            }
        });

        assert!(store.set_state("qty", json!(2)));
        assert!(!store.set_state("qty", json!(0)));
        assert_eq!(store.get_state("qty"), Some(json!(2)));
        assert_eq!(store.history_len(), 1);
    }

    #[test]
    fn test_computed_value_follows_dependencies() {
        let store = store();
        store.set_state("cart", json!([{"price": 250, "qty": 2}]));
        store.computed("cartTotal", &["cart"], |state| {
            let items = state
                .get("cart")
                .and_then(Value::as_array)
                .ok_or_else(|| "cart is not a list".to_string())?;
            let total: i64 = items
                .iter()
                .map(|i| i["price"].as_i64().unwrap_or(0) * i["qty"].as_i64().unwrap_or(0))
                .sum();
            Ok(json!(total))
        });
        assert_eq!(store.get_state("cartTotal"), Some(json!(500)));

        store.set_state("cart", json!([{"price": 100, "qty": 1}]));
        assert_eq!(store.get_state("cartTotal"), Some(json!(100)));

        store.set_state("cart", json!("broken"));
        assert!(!store.has_state("cartTotal"));
    }

    #[test]
    fn test_subscriber_may_write_other_keys() {
        let store = Arc::new(store());
        let inner = Arc::downgrade(&store);
        let _sub = store.subscribe("user", move |new, _| {
            if let (Some(store), Some(user)) = (inner.upgrade(), new) {
                store.set_state("greeting", json!(format!("Hi {}", user["name"].as_str().unwrap_or(""))));
            }
        });

        store.set_state("user", json!({"name": "Ana"}));
        assert_eq!(store.get_state("greeting"), Some(json!("Hi Ana")));
    }

    #[test]
    fn test_typed_accessors() {
        #[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug)]
        struct Settings {
            printer: String,
        }

        let store = store();
        store
            .set("settings", &Settings { printer: "usb".into() })
            .unwrap();
        let settings: Option<Settings> = store.get("settings").unwrap();
        assert_eq!(settings, Some(Settings { printer: "usb".into() }));

        let missing: Option<Settings> = store.get("nothing").unwrap();
        assert!(missing.is_none());
    }
}
