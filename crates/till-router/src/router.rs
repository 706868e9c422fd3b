//! # Router
//!
//! Route table, navigation engine and host history integration.
//!
//! ## Navigation Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  navigate(target, options)                                              │
//! │    │                                                                    │
//! │    ├─ inside a resolution? ──────────► queued, runs after it (Deferred) │
//! │    ├─ same as displayed, no force? ──► Unchanged                        │
//! │    ├─ host.push / host.replace                                          │
//! │    ├─ silent? ───────────────────────► Silent                           │
//! │    ▼                                                                    │
//! │  ┌──────────────── navigation lock (one resolution at a time) ───────┐  │
//! │  │ 1. log target                                                     │  │
//! │  │ 2. first matching route ─── none ──► not-found handler / fallback │  │
//! │  │ 3. global middleware ────── Halt / Err / Redirect ──► abort       │  │
//! │  │ 4. route middleware ─────── Halt / Err / Redirect ──► abort       │  │
//! │  │ 5. handler ──────────────── Err ──► error handler, abort          │  │
//! │  │ 6. commit: current, RouteChange broadcast, title + marker class   │  │
//! │  └───────────────────────────────────────────────────────────────────┘  │
//! │    │                                                                    │
//! │    ├─ redirect pending? ─► replace-navigate (depth + 1, max 5)          │
//! │    └─ deferred navigations ─► run in order                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Handlers and middleware may call `navigate` on the same router. The call
//! is queued instead of waiting on the lock its own resolution holds.
//!
//! `current` only moves on a successful resolution. The same-target check
//! compares against the *displayed* target instead: the last one whose
//! route or not-found handler ran, failed or not. A screen left by a
//! not-found or error handler can therefore be navigated away from.
//!
//! Handler and middleware panics are caught and reported like errors, so
//! the back/forward listener survives them.

use std::any::Any;
use std::collections::VecDeque;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde_json::Value;
use till_core::{normalize_path, parse_query, split_query, Chrome, RouteParams, RoutePattern};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::error::{BoxError, RouterError, RouterResult};
use crate::history::{HistoryHost, PopState};
use crate::link::LinkClick;
use crate::middleware::{Flow, Middleware, NavigationContext};
use crate::route::{
    boxed_handler, ErrorHandler, Handler, Route, RouteChange, RouteMatch, RouteOptions, RouteRequest,
};

// =============================================================================
// Constants
// =============================================================================

/// Maximum chained redirects before a navigation is abandoned.
pub const MAX_REDIRECT_DEPTH: usize = 5;

/// Capacity of the route change broadcast channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

tokio::task_local! {
    static RESOLVING: ();
}

// =============================================================================
// Configuration & Options
// =============================================================================

/// Router configuration.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Document title used when the route has none.
    pub app_title: String,
    /// Replace-navigation target when nothing matches.
    pub fallback_path: String,
    /// App origin for link interception.
    pub origin: Option<Url>,
    /// Redirect chain limit.
    pub max_redirects: usize,
    /// Navigation log capacity.
    pub log_capacity: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        RouterConfig {
            app_title: "Till POS".to_string(),
            fallback_path: "/".to_string(),
            origin: None,
            max_redirects: MAX_REDIRECT_DEPTH,
            log_capacity: till_core::DEFAULT_LOG_CAPACITY,
        }
    }
}

/// Options for a single `navigate` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavigateOptions {
    /// Replace the current history entry instead of pushing.
    pub replace: bool,
    /// Update history only; skip resolution.
    pub silent: bool,
    /// Opaque state stored with the history entry, passed to the handler.
    pub state: Option<Value>,
    /// Resolve even if the target equals the current location.
    pub force: bool,
}

impl NavigateOptions {
    pub fn replace(mut self) -> Self {
        self.replace = true;
        self
    }

    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }

    pub fn force(mut self) -> Self {
        self.force = true;
        self
    }

    pub fn with_state(mut self, state: Value) -> Self {
        self.state = Some(state);
        self
    }
}

/// What a navigation ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// Target equals the current location; nothing happened.
    Unchanged,
    /// History updated, resolution skipped.
    Silent,
    /// Handler ran and the route is current.
    Resolved,
    /// A middleware halted or failed.
    Blocked,
    /// A middleware redirected to the given target.
    Redirected(String),
    /// No route matched.
    NotFound,
    /// The handler failed.
    Failed,
    /// Requested from inside a resolution; runs once it finishes.
    Deferred,
}

/// One entry of the router's own navigation log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavigationLogEntry {
    pub path: String,
    pub at: DateTime<Utc>,
}

// =============================================================================
// Router
// =============================================================================

struct Current {
    route: RouteMatch,
    marker: String,
}

struct Deferred {
    target: String,
    options: NavigateOptions,
}

enum Step {
    Done(NavigationOutcome),
    Redirect { to: String, outcome: NavigationOutcome },
}

struct Inner {
    config: RouterConfig,
    host: Arc<dyn HistoryHost>,
    chrome: Arc<dyn Chrome>,
    routes: RwLock<Vec<Arc<Route>>>,
    middleware: RwLock<Vec<Arc<dyn Middleware>>>,
    not_found: RwLock<Option<Handler>>,
    error_handler: RwLock<Option<ErrorHandler>>,
    current: RwLock<Option<Current>>,
    displayed: RwLock<Option<String>>,
    log: Mutex<VecDeque<NavigationLogEntry>>,
    nav_lock: tokio::sync::Mutex<()>,
    events: broadcast::Sender<RouteChange>,
    deferred: Mutex<VecDeque<Deferred>>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

/// Client-side router. Cheap to clone; clones share one route table.
///
/// ## Example
/// ```rust,no_run
/// use std::sync::Arc;
/// use till_core::NoopChrome;
/// use till_router::{MemoryHistory, NavigateOptions, RouteOptions, Router};
///
/// # async fn demo() -> till_router::RouterResult<()> {
/// let router = Router::new(Arc::new(MemoryHistory::default()), Arc::new(NoopChrome));
/// router.add_route(
///     "/products/:id",
///     |req| async move {
///         println!("product {}", req.params["id"]);
///         Ok(())
///     },
///     RouteOptions::new().name("product"),
/// )?;
/// router.navigate("/products/42", NavigateOptions::default()).await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Router {
    inner: Arc<Inner>,
}

impl Router {
    /// Creates a router with default configuration.
    pub fn new(host: Arc<dyn HistoryHost>, chrome: Arc<dyn Chrome>) -> Self {
        Self::with_config(RouterConfig::default(), host, chrome)
    }

    pub fn with_config(config: RouterConfig, host: Arc<dyn HistoryHost>, chrome: Arc<dyn Chrome>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Router {
            inner: Arc::new(Inner {
                config,
                host,
                chrome,
                routes: RwLock::new(Vec::new()),
                middleware: RwLock::new(Vec::new()),
                not_found: RwLock::new(None),
                error_handler: RwLock::new(None),
                current: RwLock::new(None),
                displayed: RwLock::new(None),
                log: Mutex::new(VecDeque::new()),
                nav_lock: tokio::sync::Mutex::new(()),
                events,
                deferred: Mutex::new(VecDeque::new()),
                listener: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.inner.config
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Registers a route.
    ///
    /// Malformed patterns are rejected here. Registering a pattern that is
    /// already in the table replaces its handler and options in place; the
    /// route keeps its original match position.
    pub fn add_route<F, Fut>(&self, pattern: &str, handler: F, options: RouteOptions) -> RouterResult<()>
    where
        F: Fn(RouteRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        let pattern = RoutePattern::compile(pattern)?;
        let route = Arc::new(Route {
            pattern,
            handler: boxed_handler(handler),
            options,
        });

        let mut routes = self.inner.routes.write();
        match routes
            .iter()
            .position(|r| r.pattern.as_str() == route.pattern.as_str())
        {
            Some(index) => {
                debug!(pattern = %route.pattern.as_str(), "Route replaced in place");
                routes[index] = route;
            }
            None => {
                debug!(pattern = %route.pattern.as_str(), position = routes.len(), "Route registered");
                routes.push(route);
            }
        }
        Ok(())
    }

    /// Appends global middleware.
    pub fn use_middleware(&self, middleware: impl Middleware + 'static) {
        self.inner.middleware.write().push(Arc::new(middleware));
    }

    /// Sets the handler invoked when no route matches.
    pub fn on_not_found<F, Fut>(&self, handler: F)
    where
        F: Fn(RouteRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        *self.inner.not_found.write() = Some(boxed_handler(handler));
    }

    /// Sets the handler receiving navigation errors.
    pub fn on_error<F, Fut>(&self, handler: F)
    where
        F: Fn(RouterError) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler: ErrorHandler = Arc::new(move |err| Box::pin(handler(err)));
        *self.inner.error_handler.write() = Some(handler);
    }

    /// Registered patterns in match order.
    pub fn routes(&self) -> Vec<String> {
        self.inner
            .routes
            .read()
            .iter()
            .map(|r| r.pattern.as_str().to_string())
            .collect()
    }

    /// Builds the path of a named route.
    pub fn url_for(&self, name: &str, params: &RouteParams) -> RouterResult<String> {
        let routes = self.inner.routes.read();
        let route = routes
            .iter()
            .find(|r| r.options.name.as_deref() == Some(name))
            .ok_or_else(|| RouterError::UnknownRoute(name.to_string()))?;

        route.pattern.build(params).ok_or_else(|| RouterError::MissingParam {
            route: name.to_string(),
        })
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Navigates to `target`. Never fails; see [`NavigationOutcome`].
    pub async fn navigate(&self, target: &str, options: NavigateOptions) -> NavigationOutcome {
        self.navigate_at_depth(target.to_string(), options, 0).await
    }

    /// Resolves the host's current location and starts listening for
    /// back/forward moves.
    pub async fn start(&self) -> NavigationOutcome {
        let mut pops = self.inner.host.subscribe_pop();
        let router = self.clone();
        let task = tokio::spawn(async move {
            while let Some(pop) = pops.recv().await {
                router.handle_pop(pop).await;
            }
            debug!("Pop-state listener stopped");
        });
        if let Some(previous) = self.inner.listener.lock().replace(task) {
            previous.abort();
        }

        let initial = normalize_path(&self.inner.host.current_path());
        info!(path = %initial, routes = self.inner.routes.read().len(), "Router started");
        self.resolve(initial, None, 0).await
    }

    /// Stops the back/forward listener.
    pub fn stop(&self) {
        if let Some(task) = self.inner.listener.lock().take() {
            task.abort();
            debug!("Router stopped");
        }
    }

    /// Resolves a back/forward move without touching history.
    pub async fn handle_pop(&self, pop: PopState) -> NavigationOutcome {
        let target = normalize_path(&pop.path);
        debug!(path = %target, "Pop state");
        self.resolve(target, pop.state, 0).await
    }

    /// Handles an anchor click. Returns `true` if the default action should
    /// be prevented (the router took the navigation).
    pub async fn handle_link_click(&self, click: &LinkClick) -> bool {
        let current = self
            .displayed_target()
            .unwrap_or_else(|| self.inner.host.current_path());

        match click.in_app_target(self.inner.config.origin.as_ref(), &current) {
            Some(target) => {
                self.navigate(&target, NavigateOptions::default()).await;
                true
            }
            None => {
                debug!(href = %click.href, "Link left to the browser");
                false
            }
        }
    }

    /// Asks the host to go back. Resolution follows via the pop-state listener.
    pub fn back(&self) -> bool {
        self.inner.host.back()
    }

    /// Asks the host to go forward.
    pub fn forward(&self) -> bool {
        self.inner.host.forward()
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// The last successfully resolved route.
    pub fn current(&self) -> Option<RouteMatch> {
        self.inner.current.read().as_ref().map(|c| c.route.clone())
    }

    /// Path of the current route, without query.
    pub fn current_path(&self) -> Option<String> {
        self.inner.current.read().as_ref().map(|c| c.route.path.clone())
    }

    /// Target the screen reflects: the last one whose route or not-found
    /// handler ran, whether or not it succeeded.
    pub fn displayed_target(&self) -> Option<String> {
        self.inner.displayed.read().clone()
    }

    /// Navigation log, oldest first.
    pub fn navigation_log(&self) -> Vec<NavigationLogEntry> {
        self.inner.log.lock().iter().cloned().collect()
    }

    /// The target resolved before the latest one.
    pub fn previous_path(&self) -> Option<String> {
        let log = self.inner.log.lock();
        log.len()
            .checked_sub(2)
            .and_then(|i| log.get(i))
            .map(|entry| entry.path.clone())
    }

    /// Receives a [`RouteChange`] after every successful resolution.
    pub fn subscribe(&self) -> broadcast::Receiver<RouteChange> {
        self.inner.events.subscribe()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn current_target(&self) -> Option<String> {
        self.inner.current.read().as_ref().map(|c| c.route.target())
    }

    fn navigate_at_depth(&self, target: String, options: NavigateOptions, depth: usize) -> BoxFuture<'_, NavigationOutcome> {
        async move {
            let target = normalize_path(&target);

            if RESOLVING.try_with(|_| ()).is_ok() {
                debug!(target = %target, "Navigation requested during resolution, deferred");
                self.inner.deferred.lock().push_back(Deferred { target, options });
                return NavigationOutcome::Deferred;
            }

            if !options.force && self.displayed_target().as_deref() == Some(target.as_str()) {
                debug!(target = %target, "Already at target");
                return NavigationOutcome::Unchanged;
            }

            if options.replace {
                self.inner.host.replace(&target, options.state.clone());
            } else {
                self.inner.host.push(&target, options.state.clone());
            }

            if options.silent {
                debug!(target = %target, "Silent navigation");
                return NavigationOutcome::Silent;
            }

            self.resolve(target, options.state, depth).await
        }
        .boxed()
    }

    async fn resolve(&self, target: String, state: Option<Value>, depth: usize) -> NavigationOutcome {
        let step = {
            let _guard = self.inner.nav_lock.lock().await;
            RESOLVING.scope((), self.resolve_locked(&target, state)).await
        };

        let outcome = match step {
            Step::Done(outcome) => outcome,
            Step::Redirect { to, outcome } => {
                self.redirect(to, depth).await;
                outcome
            }
        };

        self.run_deferred(depth).await;
        outcome
    }

    async fn redirect(&self, to: String, depth: usize) {
        if depth + 1 > self.inner.config.max_redirects {
            error!(target = %to, depth, "Redirect limit exceeded");
            self.report(RouterError::RedirectLoop(to)).await;
            return;
        }

        if self.displayed_target().as_deref() == Some(to.as_str()) {
            self.inner.host.replace(&to, None);
            return;
        }

        self.navigate_at_depth(to, NavigateOptions::default().replace(), depth + 1)
            .await;
    }

    async fn run_deferred(&self, depth: usize) {
        loop {
            let next = self.inner.deferred.lock().pop_front();
            let Some(deferred) = next else {
                break;
            };

            if depth + 1 > self.inner.config.max_redirects {
                self.inner.deferred.lock().clear();
                error!(target = %deferred.target, "Deferred navigation chain too deep");
                self.report(RouterError::RedirectLoop(deferred.target)).await;
                break;
            }
            self.navigate_at_depth(deferred.target, deferred.options, depth + 1)
                .await;
        }
    }

    async fn resolve_locked(&self, target: &str, state: Option<Value>) -> Step {
        self.record(target);

        let (path, raw_query) = split_query(target);
        let query = raw_query.map(parse_query).unwrap_or_default();

        let matched = self
            .inner
            .routes
            .read()
            .iter()
            .find_map(|route| route.pattern.match_path(path).map(|params| (route.clone(), params)));
        let Some((route, params)) = matched else {
            return self.resolve_not_found(target, path, query, state).await;
        };

        let ctx = NavigationContext {
            path: path.to_string(),
            params: params.clone(),
            query: query.clone(),
            state: state.clone(),
            pattern: route.pattern.as_str().to_string(),
            route_name: route.options.name.clone(),
            from: self.current_path(),
        };

        let global = self.inner.middleware.read().clone();
        if let Some(step) = self.run_chain(&global, &ctx).await {
            return step;
        }
        if let Some(step) = self.run_chain(&route.options.middleware, &ctx).await {
            return step;
        }

        let request = RouteRequest {
            path: path.to_string(),
            params: params.clone(),
            query: query.clone(),
            state,
        };
        debug!(path, pattern = %route.pattern.as_str(), "Invoking route handler");
        if let Err(source) = invoke(&route.handler, request).await {
            self.set_displayed(target);
            self.report(RouterError::Handler {
                path: path.to_string(),
                source,
            })
            .await;
            return Step::Done(NavigationOutcome::Failed);
        }

        self.commit(
            &route,
            RouteMatch {
                pattern: route.pattern.as_str().to_string(),
                name: route.options.name.clone(),
                path: path.to_string(),
                params,
                query,
                raw_query: raw_query.filter(|q| !q.is_empty()).map(str::to_string),
            },
        );
        Step::Done(NavigationOutcome::Resolved)
    }

    async fn run_chain(&self, chain: &[Arc<dyn Middleware>], ctx: &NavigationContext) -> Option<Step> {
        for middleware in chain {
            let flow = match AssertUnwindSafe(middleware.handle(ctx)).catch_unwind().await {
                Ok(flow) => flow,
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    error!(path = %ctx.path, panic = %message, "Middleware panicked");
                    Err(format!("middleware panicked: {message}").into())
                }
            };
            match flow {
                Ok(Flow::Continue) => {}
                Ok(Flow::Halt) => {
                    warn!(path = %ctx.path, "Navigation blocked by middleware");
                    return Some(Step::Done(NavigationOutcome::Blocked));
                }
                Ok(Flow::Redirect(to)) => {
                    let to = normalize_path(&to);
                    info!(path = %ctx.path, redirect = %to, "Navigation redirected by middleware");
                    return Some(Step::Redirect {
                        outcome: NavigationOutcome::Redirected(to.clone()),
                        to,
                    });
                }
                Err(e) => {
                    warn!(path = %ctx.path, error = %e, "Middleware failed, navigation blocked");
                    self.report(RouterError::Middleware {
                        path: ctx.path.clone(),
                        reason: e.to_string(),
                    })
                    .await;
                    return Some(Step::Done(NavigationOutcome::Blocked));
                }
            }
        }
        None
    }

    async fn resolve_not_found(
        &self,
        target: &str,
        path: &str,
        query: till_core::QueryParams,
        state: Option<Value>,
    ) -> Step {
        warn!(path, "No route matches");

        let handler = self.inner.not_found.read().clone();
        if let Some(handler) = handler {
            let request = RouteRequest {
                path: path.to_string(),
                params: RouteParams::new(),
                query,
                state,
            };
            let result = invoke(&handler, request).await;
            self.set_displayed(target);
            if let Err(source) = result {
                self.report(RouterError::Handler {
                    path: path.to_string(),
                    source,
                })
                .await;
                return Step::Done(NavigationOutcome::Failed);
            }
            return Step::Done(NavigationOutcome::NotFound);
        }

        let fallback = normalize_path(&self.inner.config.fallback_path);
        if split_query(&fallback).0 == path {
            error!(path, "Fallback route does not match any route");
            self.report(RouterError::NotFound(path.to_string())).await;
            return Step::Done(NavigationOutcome::NotFound);
        }

        Step::Redirect {
            to: fallback,
            outcome: NavigationOutcome::NotFound,
        }
    }

    fn commit(&self, route: &Route, matched: RouteMatch) {
        let marker = route.marker_class();
        let previous = self.inner.current.write().replace(Current {
            route: matched.clone(),
            marker: marker.clone(),
        });

        let chrome = &self.inner.chrome;
        if let Some(previous) = &previous {
            if previous.marker != marker {
                chrome.remove_marker_class(&previous.marker);
            }
        }
        chrome.add_marker_class(&marker);
        chrome.set_title(
            route
                .options
                .title
                .as_deref()
                .unwrap_or(&self.inner.config.app_title),
        );

        self.set_displayed(&matched.target());
        info!(path = %matched.path, pattern = %matched.pattern, "Route changed");
        // No receivers is fine
        let _ = self.inner.events.send(RouteChange {
            from: previous.map(|p| p.route),
            to: matched,
        });
    }

    fn set_displayed(&self, target: &str) {
        *self.inner.displayed.write() = Some(target.to_string());
    }

    fn record(&self, target: &str) {
        let capacity = self.inner.config.log_capacity.max(1);
        let mut log = self.inner.log.lock();
        while log.len() >= capacity {
            log.pop_front();
        }
        log.push_back(NavigationLogEntry {
            path: target.to_string(),
            at: Utc::now(),
        });
    }

    async fn report(&self, err: RouterError) {
        let handler = self.inner.error_handler.read().clone();
        match handler {
            Some(handler) => {
                debug!(error = %err, "Navigation error reported to handler");
                if let Err(payload) = AssertUnwindSafe(async move { handler(err).await })
                    .catch_unwind()
                    .await
                {
                    error!(panic = %panic_message(payload.as_ref()), "Error handler panicked");
                }
            }
            None => error!(error = %err, "Navigation error"),
        }
    }
}

/// Runs a route or not-found handler, turning a panic into an error.
async fn invoke(handler: &Handler, request: RouteRequest) -> Result<(), BoxError> {
    match AssertUnwindSafe(async move { handler(request).await })
        .catch_unwind()
        .await
    {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(panic = %message, "Route handler panicked");
            Err(format!("handler panicked: {message}").into())
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.routes())
            .field("current", &self.current_target())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
