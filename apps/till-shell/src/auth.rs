//! # Session Middleware
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Middleware     Attached to                    Signed out   Signed in   │
//! │  ──────────     ───────────                    ──────────   ─────────   │
//! │  RequireAuth    /, /pos, /products, /products/:id  → /login?next  pass  │
//! │  GuestOnly      /login                         pass         → /          │
//! │  Logout         /logout                        → /login     clear, →    │
//! │                                                             /login      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use till_router::{BoxError, Flow, Middleware, NavigationContext};
use till_store::StateManager;
use till_view::Notifier;
use tracing::{debug, info};

use crate::context::TOKEN_KEY;

fn has_session(state: &StateManager) -> bool {
    state
        .get_state(TOKEN_KEY)
        .and_then(|token| token.as_str().map(|t| !t.is_empty()))
        .unwrap_or(false)
}

/// Login URL that returns to `path` afterwards.
pub fn login_redirect(path: &str) -> String {
    if path == "/" {
        return "/login".to_string();
    }
    let next: String = url::form_urlencoded::byte_serialize(path.as_bytes()).collect();
    format!("/login?next={next}")
}

/// Sends signed-out users to `/login`.
#[derive(Clone)]
pub struct RequireAuth {
    state: Arc<StateManager>,
}

impl RequireAuth {
    pub fn new(state: Arc<StateManager>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Middleware for RequireAuth {
    async fn handle(&self, ctx: &NavigationContext) -> Result<Flow, BoxError> {
        if has_session(&self.state) {
            return Ok(Flow::Continue);
        }
        debug!(path = %ctx.path, "No session, redirecting to login");
        Ok(Flow::Redirect(login_redirect(&ctx.path)))
    }
}

/// Keeps signed-in users off the login page.
#[derive(Clone)]
pub struct GuestOnly {
    state: Arc<StateManager>,
}

impl GuestOnly {
    pub fn new(state: Arc<StateManager>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Middleware for GuestOnly {
    async fn handle(&self, _ctx: &NavigationContext) -> Result<Flow, BoxError> {
        if has_session(&self.state) {
            Ok(Flow::Redirect("/".into()))
        } else {
            Ok(Flow::Continue)
        }
    }
}

/// Ends the session and lands on `/login`. The route handler never runs.
pub struct Logout {
    state: Arc<StateManager>,
    notifier: Arc<dyn Notifier>,
}

impl Logout {
    pub fn new(state: Arc<StateManager>, notifier: Arc<dyn Notifier>) -> Self {
        Self { state, notifier }
    }
}

#[async_trait]
impl Middleware for Logout {
    async fn handle(&self, _ctx: &NavigationContext) -> Result<Flow, BoxError> {
        if has_session(&self.state) {
            self.state.clear_sensitive_data();
            self.notifier.info("Signed out");
            info!("Signed out");
        }
        Ok(Flow::Redirect("/login".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use till_core::{QueryParams, RouteParams};
    use till_view::NotificationCenter;

    fn nav(path: &str) -> NavigationContext {
        NavigationContext {
            path: path.into(),
            params: RouteParams::new(),
            query: QueryParams::new(),
            state: None,
            pattern: path.into(),
            route_name: None,
            from: None,
        }
    }

    #[test]
    fn test_login_redirect_keeps_target() {
        assert_eq!(login_redirect("/"), "/login");
        assert_eq!(login_redirect("/products/42"), "/login?next=%2Fproducts%2F42");
    }

    #[tokio::test]
    async fn test_require_auth() {
        let state = Arc::new(StateManager::in_memory());
        let guard = RequireAuth::new(state.clone());

        assert_eq!(
            guard.handle(&nav("/pos")).await.unwrap(),
            Flow::Redirect("/login?next=%2Fpos".into())
        );

        state.set_state(TOKEN_KEY, json!("t-1"));
        assert_eq!(guard.handle(&nav("/pos")).await.unwrap(), Flow::Continue);
        assert_eq!(GuestOnly::new(state).handle(&nav("/login")).await.unwrap(), Flow::Redirect("/".into()));
    }

    #[tokio::test]
    async fn test_logout_clears_sensitive_keys_only() {
        let state = Arc::new(StateManager::in_memory());
        state.set_state(TOKEN_KEY, json!("t-1"));
        state.set_state("cart", json!([{"sku": "COKE"}]));
        state.set_state("theme", json!("dark"));
        let center = Arc::new(NotificationCenter::default());

        let logout = Logout::new(state.clone(), center.clone());
        assert_eq!(logout.handle(&nav("/logout")).await.unwrap(), Flow::Redirect("/login".into()));

        assert!(!state.has_state(TOKEN_KEY));
        assert!(!state.has_state("cart"));
        assert!(state.has_state("theme"));
        assert_eq!(center.visible().len(), 1);
    }
}
