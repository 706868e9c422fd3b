//! # BaseView
//!
//! The state every view carries: its injected mount point, a snapshot of the
//! route parameters, local key/value state, the chrome capability and the
//! tracked resources released on destroy.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use till_core::{Chrome, FormValidator, RouteParams, ValidationReport};
use tracing::debug;

use crate::event::{EventTarget, ListenerId};
use crate::mount::MountPoint;
use crate::resources::{ResourceTracker, TimerId};

/// Lifecycle state of a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    Uninitialized,
    Initialized,
    Destroyed,
}

/// Shared state and tracked resources of a view.
pub struct BaseView {
    name: String,
    mount: Arc<dyn MountPoint>,
    chrome: Arc<dyn Chrome>,
    params: RouteParams,
    local: Mutex<BTreeMap<String, Value>>,
    resources: Mutex<ResourceTracker>,
    pub(crate) lifecycle: Mutex<Lifecycle>,
}

impl BaseView {
    /// Creates the base for a view named `name` (used for its marker class).
    pub fn new(
        name: impl Into<String>,
        mount: Arc<dyn MountPoint>,
        chrome: Arc<dyn Chrome>,
        params: RouteParams,
    ) -> Self {
        BaseView {
            name: name.into(),
            mount,
            chrome,
            params,
            local: Mutex::new(BTreeMap::new()),
            resources: Mutex::new(ResourceTracker::default()),
            lifecycle: Mutex::new(Lifecycle::Uninitialized),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mount(&self) -> &Arc<dyn MountPoint> {
        &self.mount
    }

    pub fn chrome(&self) -> &Arc<dyn Chrome> {
        &self.chrome
    }

    /// Route parameters the view was created with.
    pub fn params(&self) -> &RouteParams {
        &self.params
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn lifecycle(&self) -> Lifecycle {
        *self.lifecycle.lock()
    }

    /// Body marker class while the view is alive.
    pub fn marker_class(&self) -> String {
        format!("view-{}", self.name)
    }

    // =========================================================================
    // Local State
    // =========================================================================

    pub fn set_local(&self, key: &str, value: Value) {
        self.local.lock().insert(key.to_string(), value);
    }

    pub fn local(&self, key: &str) -> Option<Value> {
        self.local.lock().get(key).cloned()
    }

    pub(crate) fn reset_local(&self) {
        self.local.lock().clear();
    }

    // =========================================================================
    // Tracked Resources
    // =========================================================================

    /// Adds a listener to `target` and tracks it for release on destroy.
    pub fn add_event_listener<F>(&self, target: &Arc<EventTarget>, event: &str, listener: F) -> ListenerId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.resources.lock().add_listener(target, event, listener)
    }

    /// Runs `task` once after `delay`. Must be called inside a tokio runtime.
    pub fn set_timeout<F, Fut>(&self, delay: Duration, task: F) -> TimerId
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.resources.lock().set_timeout(delay, task)
    }

    /// Runs `task` every `period`. Must be called inside a tokio runtime.
    pub fn set_interval<F, Fut>(&self, period: Duration, task: F) -> TimerId
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.resources.lock().set_interval(period, task)
    }

    /// Cancels a single tracked timer.
    pub fn cancel_timer(&self, id: TimerId) -> bool {
        self.resources.lock().cancel(id)
    }

    pub fn remove_event_listeners(&self) {
        let removed = self.resources.lock().remove_listeners();
        debug!(view = %self.name, removed, "Event listeners removed");
    }

    pub fn clear_timeouts(&self) {
        let cleared = self.resources.lock().clear_timeouts();
        debug!(view = %self.name, cleared, "Timeouts cleared");
    }

    pub fn clear_intervals(&self) {
        let cleared = self.resources.lock().clear_intervals();
        debug!(view = %self.name, cleared, "Intervals cleared");
    }

    /// `(listeners, pending timeouts, intervals)` currently tracked.
    pub fn tracked_resources(&self) -> (usize, usize, usize) {
        self.resources.lock().counts()
    }

    pub(crate) fn release_resources(&self) {
        self.remove_event_listeners();
        self.clear_timeouts();
        self.clear_intervals();
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Validates form values and annotates every field on the mount point.
    ///
    /// Fields that pass have their previous annotation removed.
    pub fn validate_form(&self, validator: &FormValidator, values: &HashMap<String, String>) -> ValidationReport {
        let report = validator.validate(values);
        for field in validator.field_names() {
            let message = report.error_for(field).map(|e| e.to_string());
            self.mount.set_field_error(field, message.as_deref());
        }
        if !report.is_valid() {
            debug!(view = %self.name, errors = report.errors().len(), "Form validation failed");
        }
        report
    }
}

impl std::fmt::Debug for BaseView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaseView")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("lifecycle", &self.lifecycle())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mount::MemoryMount;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use till_core::{FieldRules, NoopChrome};

    fn base(mount: Arc<MemoryMount>) -> BaseView {
        let params = RouteParams::from([("id".to_string(), "42".to_string())]);
        BaseView::new("product-detail", mount, Arc::new(NoopChrome), params)
    }

    #[test]
    fn test_params_and_local_state() {
        let view = base(Arc::new(MemoryMount::new()));
        assert_eq!(view.param("id"), Some("42"));
        assert_eq!(view.marker_class(), "view-product-detail");

        view.set_local("qty", serde_json::json!(2));
        assert_eq!(view.local("qty"), Some(serde_json::json!(2)));
        view.reset_local();
        assert!(view.local("qty").is_none());
    }

    #[test]
    fn test_validate_form_annotates_fields() {
        let mount = Arc::new(MemoryMount::new());
        let view = base(mount.clone());
        let validator = FormValidator::new()
            .field("username", FieldRules::new().required().min_length(3))
            .field("pin", FieldRules::new().required());

        let values = HashMap::from([("username".to_string(), "al".to_string())]);
        let report = view.validate_form(&validator, &values);
        assert!(!report.is_valid());
        assert_eq!(mount.field_errors().len(), 2);

        let values = HashMap::from([
            ("username".to_string(), "alice".to_string()),
            ("pin".to_string(), "1234".to_string()),
        ]);
        assert!(view.validate_form(&validator, &values).is_valid());
        assert!(mount.field_errors().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeouts_and_intervals_are_cancelled() {
        let view = base(Arc::new(MemoryMount::new()));
        let fired = Arc::new(AtomicUsize::new(0));
        let ticks = Arc::new(AtomicUsize::new(0));

        let counter = fired.clone();
        view.set_timeout(Duration::from_millis(100), move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let counter = ticks.clone();
        view.set_interval(Duration::from_millis(40), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(90)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(ticks.load(Ordering::SeqCst), 2);

        view.clear_timeouts();
        view.clear_intervals();
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(ticks.load(Ordering::SeqCst), 2);
        assert_eq!(view.tracked_resources(), (0, 0, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_single_timer() {
        let view = base(Arc::new(MemoryMount::new()));
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = fired.clone();
        let first = view.set_timeout(Duration::from_millis(10), move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let counter = fired.clone();
        view.set_timeout(Duration::from_millis(10), move || async move {
            counter.fetch_add(10, Ordering::SeqCst);
        });

        assert!(view.cancel_timer(first));
        assert!(!view.cancel_timer(first));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 10);
    }
}
