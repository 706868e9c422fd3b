//! # View Contract
//!
//! Concrete screens implement [`View`]; [`ViewInstance`] owns the lifecycle
//! sequence so no view can skip a step.
//!
//! ## Sequences
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  init()                                                                 │
//! │    already initialized or initializing? ── warn, return Ok               │
//! │    chrome: title + "view-<name>" class                                  │
//! │    on_init().await ── Err ──► chrome + resources rolled back, Err out   │
//! │    destroyed meanwhile? ─────► resources released again, Err out        │
//! │    lifecycle = Initialized                                              │
//! │                                                                         │
//! │  destroy()                                                              │
//! │    already destroyed, not initializing? ── return                       │
//! │    on_destroy()         (error or panic logged)                         │
//! │    listeners removed, timeouts + intervals aborted                      │
//! │    "view-<name>" class removed, mount cleared, local state reset        │
//! │    lifecycle = Destroyed                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, warn};

use crate::base::{BaseView, Lifecycle};
use crate::error::{ViewError, ViewResult};

/// A navigable screen.
#[async_trait]
pub trait View: Send + Sync {
    /// Shared state and tracked resources.
    fn base(&self) -> &BaseView;

    /// Document title while the view is shown.
    fn title(&self) -> Option<String> {
        None
    }

    /// Async setup: load data, register listeners and timers.
    async fn on_init(&self) -> ViewResult<()> {
        Ok(())
    }

    /// Populates the mount point.
    async fn render(&self) -> ViewResult<()>;

    /// View-specific teardown, run before tracked resources are released.
    fn on_destroy(&self) -> ViewResult<()> {
        Ok(())
    }
}

/// Drives a [`View`] through its lifecycle.
#[derive(Clone)]
pub struct ViewInstance {
    view: Arc<dyn View>,
    initializing: Arc<AtomicBool>,
    cancelled: Arc<AtomicBool>,
}

impl ViewInstance {
    pub fn new(view: impl View + 'static) -> Self {
        Self::from_arc(Arc::new(view))
    }

    pub fn from_arc(view: Arc<dyn View>) -> Self {
        ViewInstance {
            view,
            initializing: Arc::new(AtomicBool::new(false)),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn view(&self) -> &Arc<dyn View> {
        &self.view
    }

    pub fn name(&self) -> &str {
        self.view.base().name()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.view.base().lifecycle()
    }

    pub fn is_initialized(&self) -> bool {
        self.lifecycle() == Lifecycle::Initialized
    }

    /// Runs the init sequence. A repeated call is a no-op with a warning.
    pub async fn init(&self) -> ViewResult<()> {
        let base = self.view.base();
        if base.lifecycle() == Lifecycle::Initialized
            || self.initializing.swap(true, Ordering::SeqCst)
        {
            warn!(view = %base.name(), "View already initialized, init ignored");
            return Ok(());
        }
        self.cancelled.store(false, Ordering::SeqCst);

        let chrome = base.chrome();
        if let Some(title) = self.view.title() {
            chrome.set_title(&title);
        }
        let marker = base.marker_class();
        chrome.add_marker_class(&marker);

        let result = self.view.on_init().await;
        self.initializing.store(false, Ordering::SeqCst);

        if self.cancelled.swap(false, Ordering::SeqCst) {
            // destroy already ran; drop whatever on_init registered after it
            warn!(view = %base.name(), "View destroyed while initializing");
            base.release_resources();
            chrome.remove_marker_class(&marker);
            base.mount().clear();
            base.reset_local();
            return Err(ViewError::DestroyedDuringInit(base.name().to_string()));
        }

        match result {
            Ok(()) => {
                *base.lifecycle.lock() = Lifecycle::Initialized;
                debug!(view = %base.name(), "View initialized");
                Ok(())
            }
            Err(e) => {
                warn!(view = %base.name(), error = %e, "View failed to initialize");
                chrome.remove_marker_class(&marker);
                base.release_resources();
                Err(e)
            }
        }
    }

    /// Renders the view. Fails unless the view is initialized.
    pub async fn render(&self) -> ViewResult<()> {
        if !self.is_initialized() {
            return Err(ViewError::NotInitialized(self.name().to_string()));
        }
        self.view.render().await
    }

    /// `init` followed by `render`.
    pub async fn mount(&self) -> ViewResult<()> {
        self.init().await?;
        self.render().await
    }

    /// Runs the destroy sequence. Idempotent, never fails.
    pub fn destroy(&self) {
        let base = self.view.base();
        let initializing = self.initializing.load(Ordering::SeqCst);
        if base.lifecycle() == Lifecycle::Destroyed && !initializing {
            debug!(view = %base.name(), "View already destroyed");
            return;
        }
        if initializing {
            self.cancelled.store(true, Ordering::SeqCst);
        }

        match catch_unwind(AssertUnwindSafe(|| self.view.on_destroy())) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(view = %base.name(), error = %e, "on_destroy failed"),
            Err(_) => error!(view = %base.name(), "on_destroy panicked"),
        }

        base.release_resources();
        base.chrome().remove_marker_class(&base.marker_class());
        base.mount().clear();
        base.reset_local();
        *base.lifecycle.lock() = Lifecycle::Destroyed;
        debug!(view = %base.name(), "View destroyed");
    }
}

impl std::fmt::Debug for ViewInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewInstance")
            .field("name", &self.name())
            .field("lifecycle", &self.lifecycle())
            .finish()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventTarget;
    use crate::mount::{MemoryMount, MountPoint};
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use till_core::{RecordingChrome, RouteParams};

    struct Counter {
        base: BaseView,
        button: Arc<EventTarget>,
        clicks: Arc<AtomicUsize>,
        fail_init: bool,
        fail_destroy: bool,
        inits: AtomicUsize,
    }

    impl Counter {
        fn new(mount: Arc<MemoryMount>, chrome: Arc<RecordingChrome>) -> Self {
            Counter {
                base: BaseView::new("counter", mount, chrome, RouteParams::new()),
                button: Arc::new(EventTarget::new("button#add")),
                clicks: Arc::new(AtomicUsize::new(0)),
                fail_init: false,
                fail_destroy: false,
                inits: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl View for Counter {
        fn base(&self) -> &BaseView {
            &self.base
        }

        fn title(&self) -> Option<String> {
            Some("Counter".into())
        }

        async fn on_init(&self) -> ViewResult<()> {
            self.inits.fetch_add(1, Ordering::SeqCst);
            let clicks = self.clicks.clone();
            self.base.add_event_listener(&self.button, "click", move |_| {
                clicks.fetch_add(1, Ordering::SeqCst);
            });
            self.base
                .set_interval(Duration::from_secs(1), || async {});
            if self.fail_init {
                return Err(ViewError::Init {
                    view: "counter".into(),
                    reason: "backend unreachable".into(),
                });
            }
            self.base.set_local("count", json!(0));
            Ok(())
        }

        async fn render(&self) -> ViewResult<()> {
            self.base.mount().set_content("<button id=add>+</button>");
            Ok(())
        }

        fn on_destroy(&self) -> ViewResult<()> {
            if self.fail_destroy {
                return Err(ViewError::Validation("teardown failed".into()));
            }
            Ok(())
        }
    }

    fn setup() -> (Arc<MemoryMount>, Arc<RecordingChrome>) {
        (Arc::new(MemoryMount::new()), Arc::new(RecordingChrome::new()))
    }

    #[tokio::test]
    async fn test_mount_applies_chrome_and_renders() {
        let (mount, chrome) = setup();
        let view = ViewInstance::new(Counter::new(mount.clone(), chrome.clone()));

        view.mount().await.unwrap();

        assert!(view.is_initialized());
        assert_eq!(chrome.title(), "Counter");
        assert!(chrome.has_class("view-counter"));
        assert_eq!(mount.content(), "<button id=add>+</button>");
    }

    #[tokio::test]
    async fn test_second_init_is_a_no_op() {
        let (mount, chrome) = setup();
        let counter = Arc::new(Counter::new(mount, chrome));
        let view = ViewInstance::from_arc(counter.clone());

        view.init().await.unwrap();
        view.init().await.unwrap();
        assert_eq!(counter.inits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_render_requires_init() {
        let (mount, chrome) = setup();
        let view = ViewInstance::new(Counter::new(mount.clone(), chrome));

        assert!(matches!(view.render().await, Err(ViewError::NotInitialized(_))));
        assert!(mount.content().is_empty());
    }

    #[tokio::test]
    async fn test_failed_init_rolls_back() {
        let (mount, chrome) = setup();
        let mut counter = Counter::new(mount, chrome.clone());
        counter.fail_init = true;
        let counter = Arc::new(counter);
        let view = ViewInstance::from_arc(counter.clone());

        let err = view.init().await.unwrap_err();
        assert!(matches!(err, ViewError::Init { .. }));
        assert_eq!(view.lifecycle(), Lifecycle::Uninitialized);
        assert!(!chrome.has_class("view-counter"));
        assert_eq!(counter.button.listener_count("click"), 0);
        assert_eq!(counter.base.tracked_resources(), (0, 0, 0));
    }

    #[tokio::test]
    async fn test_destroy_twice_clears_mount_once() {
        let (mount, chrome) = setup();
        let view = ViewInstance::new(Counter::new(mount.clone(), chrome.clone()));
        view.mount().await.unwrap();

        view.destroy();
        view.destroy();

        assert_eq!(mount.clear_count(), 1);
        assert!(mount.content().is_empty());
        assert_eq!(view.lifecycle(), Lifecycle::Destroyed);
        assert!(!chrome.has_class("view-counter"));
    }

    struct Slow {
        base: BaseView,
        button: Arc<EventTarget>,
        started: Arc<tokio::sync::Notify>,
        release: Arc<tokio::sync::Notify>,
    }

    #[async_trait]
    impl View for Slow {
        fn base(&self) -> &BaseView {
            &self.base
        }

        async fn on_init(&self) -> ViewResult<()> {
            self.base.add_event_listener(&self.button, "click", |_| {});
            self.started.notify_one();
            self.release.notified().await;
            self.base.set_interval(Duration::from_secs(1), || async {});
            Ok(())
        }

        async fn render(&self) -> ViewResult<()> {
            self.base.mount().set_content("slow");
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_destroy_during_init_leaves_nothing_registered() {
        let (mount, chrome) = setup();
        let slow = Arc::new(Slow {
            base: BaseView::new("slow", mount.clone(), chrome.clone(), RouteParams::new()),
            button: Arc::new(EventTarget::new("button#slow")),
            started: Arc::new(tokio::sync::Notify::new()),
            release: Arc::new(tokio::sync::Notify::new()),
        });
        let view = ViewInstance::from_arc(slow.clone());

        let mounting = tokio::spawn({
            let view = view.clone();
            async move { view.mount().await }
        });
        slow.started.notified().await;
        view.destroy();
        slow.release.notify_one();

        let result = mounting.await.unwrap();
        assert!(matches!(result, Err(ViewError::DestroyedDuringInit(name)) if name == "slow"));
        assert_eq!(view.lifecycle(), Lifecycle::Destroyed);
        assert_eq!(slow.base.tracked_resources(), (0, 0, 0));
        assert_eq!(slow.button.listener_count("click"), 0);
        assert!(!chrome.has_class("view-slow"));
        assert!(mount.content().is_empty());
    }

    #[tokio::test]
    async fn test_destroyed_view_stops_receiving_events() {
        let (mount, chrome) = setup();
        let counter = Arc::new(Counter::new(mount, chrome));
        let view = ViewInstance::from_arc(counter.clone());
        view.mount().await.unwrap();

        counter.button.dispatch("click", &json!({}));
        assert_eq!(counter.clicks.load(Ordering::SeqCst), 1);

        view.destroy();
        assert_eq!(counter.button.dispatch("click", &json!({})), 0);
        assert_eq!(counter.clicks.load(Ordering::SeqCst), 1);
        assert!(counter.base.local("count").is_none());
        assert_eq!(counter.base.tracked_resources(), (0, 0, 0));
    }

    #[tokio::test]
    async fn test_destroy_error_is_swallowed() {
        let (mount, chrome) = setup();
        let mut counter = Counter::new(mount.clone(), chrome);
        counter.fail_destroy = true;
        let view = ViewInstance::new(counter);
        view.mount().await.unwrap();

        view.destroy();
        assert_eq!(view.lifecycle(), Lifecycle::Destroyed);
        assert_eq!(mount.clear_count(), 1);
    }

    #[tokio::test]
    async fn test_reinit_after_destroy() {
        let (mount, chrome) = setup();
        let counter = Arc::new(Counter::new(mount, chrome.clone()));
        let view = ViewInstance::from_arc(counter.clone());

        view.mount().await.unwrap();
        view.destroy();
        view.mount().await.unwrap();

        assert!(view.is_initialized());
        assert_eq!(counter.inits.load(Ordering::SeqCst), 2);
        assert!(chrome.has_class("view-counter"));
    }

    #[test]
    fn test_destroy_uninitialized_view_still_cleans_up() {
        let (mount, chrome) = setup();
        let view = ViewInstance::new(Counter::new(mount.clone(), chrome));

        view.destroy();
        assert_eq!(view.lifecycle(), Lifecycle::Destroyed);
        assert_eq!(mount.clear_count(), 1);
    }
}
