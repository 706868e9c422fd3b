//! Route definitions and the records the router publishes about them.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;
use till_core::{QueryParams, RouteParams, RoutePattern};

use crate::error::{BoxError, RouterError};
use crate::middleware::Middleware;

/// Arguments passed to a route handler.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    /// Normalized path, without query.
    pub path: String,
    /// Parameters by name. Iteration is in key order; the route's
    /// `RoutePattern::param_names` gives declaration order.
    pub params: RouteParams,
    /// Decoded query string.
    pub query: QueryParams,
    /// History state passed to `navigate`.
    pub state: Option<Value>,
}

/// Type-erased async route handler.
pub type Handler = Arc<dyn Fn(RouteRequest) -> BoxFuture<'static, Result<(), BoxError>> + Send + Sync>;

/// Type-erased async error handler.
pub type ErrorHandler = Arc<dyn Fn(RouterError) -> BoxFuture<'static, ()> + Send + Sync>;

pub(crate) fn boxed_handler<F, Fut>(handler: F) -> Handler
where
    F: Fn(RouteRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    Arc::new(move |request| Box::pin(handler(request)))
}

/// Optional route attributes.
#[derive(Default, Clone)]
pub struct RouteOptions {
    pub(crate) name: Option<String>,
    pub(crate) title: Option<String>,
    pub(crate) middleware: Vec<Arc<dyn Middleware>>,
}

impl RouteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names the route for `url_for` and its marker class.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Document title while the route is current.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Appends route-level middleware.
    pub fn middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }
}

impl std::fmt::Debug for RouteOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteOptions")
            .field("name", &self.name)
            .field("title", &self.title)
            .field("middleware", &self.middleware.len())
            .finish()
    }
}

/// A compiled pattern bound to its handler. Never mutated once registered.
pub(crate) struct Route {
    pub(crate) pattern: RoutePattern,
    pub(crate) handler: Handler,
    pub(crate) options: RouteOptions,
}

impl Route {
    /// Body marker class while this route is current.
    pub(crate) fn marker_class(&self) -> String {
        match &self.options.name {
            Some(name) => format!("route-{name}"),
            None => format!("route-{}", self.pattern.slug()),
        }
    }
}

/// The most recently resolved route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteMatch {
    /// Pattern of the matched route.
    pub pattern: String,
    /// Name of the matched route.
    pub name: Option<String>,
    /// Normalized path, without query.
    pub path: String,
    /// Extracted parameters.
    pub params: RouteParams,
    /// Decoded query string.
    pub query: QueryParams,
    /// Raw query string, kept so the full target can be rebuilt.
    #[serde(skip)]
    pub(crate) raw_query: Option<String>,
}

impl RouteMatch {
    /// Path plus query string, as it was navigated to.
    pub fn target(&self) -> String {
        match &self.raw_query {
            Some(query) => format!("{}?{}", self.path, query),
            None => self.path.clone(),
        }
    }
}

/// Published to subscribers after each successful resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteChange {
    /// Route that was current before, if any.
    pub from: Option<RouteMatch>,
    /// Route that is current now.
    pub to: RouteMatch,
}
