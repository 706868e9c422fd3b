//! # Navigation Middleware
//!
//! Gatekeepers run before a route handler. Global middleware runs first, in
//! registration order, then the matched route's own list.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Result                       Effect                                    │
//! │  ──────                       ──────                                    │
//! │  Ok(Flow::Continue)           next middleware, then the handler         │
//! │  Ok(Flow::Halt)               navigation aborted, current unchanged     │
//! │  Ok(Flow::Redirect(target))   aborted, then replace-navigate to target  │
//! │  Err(e)                       same as Halt, error reported              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::future::Future;

use async_trait::async_trait;
use serde_json::Value;
use till_core::{QueryParams, RouteParams};

use crate::error::BoxError;

/// Outcome of a middleware step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    /// Let the navigation proceed.
    Continue,
    /// Abort the navigation.
    Halt,
    /// Abort and replace-navigate to the given target.
    Redirect(String),
}

/// What a middleware sees about the navigation in flight.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationContext {
    /// Normalized path, without query.
    pub path: String,
    /// Parameters extracted by the matched route.
    pub params: RouteParams,
    /// Decoded query string.
    pub query: QueryParams,
    /// History state passed to `navigate`.
    pub state: Option<Value>,
    /// Pattern of the matched route.
    pub pattern: String,
    /// Name of the matched route, if it has one.
    pub route_name: Option<String>,
    /// Path of the route that was current when the navigation started.
    pub from: Option<String>,
}

/// A navigation gatekeeper.
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn handle(&self, ctx: &NavigationContext) -> Result<Flow, BoxError>;
}

/// Middleware built from an async closure. See [`from_fn`].
pub struct FnMiddleware<F> {
    f: F,
}

/// Wraps an async closure as middleware.
///
/// ```rust
/// use till_router::{from_fn, Flow};
///
/// let admin_only = from_fn(|ctx| async move {
///     if ctx.path.starts_with("/admin") {
///         Ok(Flow::Halt)
///     } else {
///         Ok(Flow::Continue)
///     }
/// });
/// # let _ = admin_only;
/// ```
pub fn from_fn<F, Fut>(f: F) -> FnMiddleware<F>
where
    F: Fn(NavigationContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Flow, BoxError>> + Send + 'static,
{
    FnMiddleware { f }
}

#[async_trait]
impl<F, Fut> Middleware for FnMiddleware<F>
where
    F: Fn(NavigationContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Flow, BoxError>> + Send + 'static,
{
    async fn handle(&self, ctx: &NavigationContext) -> Result<Flow, BoxError> {
        (self.f)(ctx.clone()).await
    }
}
