//! # Application Context
//!
//! The services every view is built with. Cloning is cheap; every field is
//! shared.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  AppContext                                                             │
//! │    state     Arc<StateManager>     user, token, cart, lastSale ...      │
//! │    router    Router                navigate, url_for                     │
//! │    notifier  Arc<dyn Notifier>     toasts                               │
//! │    api       Arc<dyn ApiClient>    HTTP or canned responses             │
//! │    chrome    Arc<dyn Chrome>       title, marker classes                │
//! │    mount     Arc<dyn MountPoint>   the app container                    │
//! │    document  Arc<EventTarget>      "submit" / "action" events           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use till_core::{Chrome, RouteParams};
use till_router::{NavigateOptions, Router};
use till_store::StateManager;
use till_view::{ApiClient, BaseView, EventTarget, MountPoint, Notifier};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Signed-in user record.
pub const USER_KEY: &str = "user";
/// Bearer token sent with every API request.
pub const TOKEN_KEY: &str = "token";
/// Lines of the sale being rung up.
pub const CART_KEY: &str = "cart";
/// Server response for the last completed sale.
pub const LAST_SALE_KEY: &str = "lastSale";

/// Form submission, payload is an object of string fields.
pub const SUBMIT_EVENT: &str = "submit";
/// Named view action, payload is `{"name": .., "args": [..]}`.
pub const ACTION_EVENT: &str = "action";

/// Shared services passed to every view.
#[derive(Clone)]
pub struct AppContext {
    pub state: Arc<StateManager>,
    pub router: Router,
    pub notifier: Arc<dyn Notifier>,
    pub api: Arc<dyn ApiClient>,
    pub chrome: Arc<dyn Chrome>,
    pub mount: Arc<dyn MountPoint>,
    pub document: Arc<EventTarget>,
    tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl AppContext {
    pub fn new(
        state: Arc<StateManager>,
        router: Router,
        notifier: Arc<dyn Notifier>,
        api: Arc<dyn ApiClient>,
        chrome: Arc<dyn Chrome>,
        mount: Arc<dyn MountPoint>,
    ) -> Self {
        AppContext {
            state,
            router,
            notifier,
            api,
            chrome,
            mount,
            document: Arc::new(EventTarget::new("document")),
            tasks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A [`BaseView`] on the app container.
    pub fn base_view(&self, name: &str, params: RouteParams) -> BaseView {
        BaseView::new(name, self.mount.clone(), self.chrome.clone(), params)
    }

    /// True while a non-empty token is held.
    pub fn is_authenticated(&self) -> bool {
        matches!(self.state.get_state(TOKEN_KEY), Some(Value::String(token)) if !token.is_empty())
    }

    /// Runs async work started by an event listener.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(task);
        let mut tasks = self.tasks.lock();
        tasks.retain(|t| !t.is_finished());
        tasks.push(handle);
    }

    /// Waits until all spawned work, including work it spawned, is done.
    pub async fn settle(&self) {
        loop {
            let pending: Vec<JoinHandle<()>> = self.tasks.lock().drain(..).collect();
            if pending.is_empty() {
                return;
            }
            for task in pending {
                if let Err(e) = task.await {
                    warn!(error = %e, "Background task failed");
                }
            }
        }
    }

    /// Drops the session after the API rejected the token.
    pub async fn expire_session(&self) {
        info!("Session expired");
        self.notifier.warning("Your session has expired. Please sign in again.");
        self.state.clear_sensitive_data();
        self.router
            .navigate("/login", NavigateOptions::default().replace())
            .await;
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("state", &self.state)
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Event Payloads
// =============================================================================

/// String fields of a submit payload. Non-string values are skipped.
pub fn form_fields(payload: &Value) -> HashMap<String, String> {
    payload
        .as_object()
        .map(|fields| {
            fields
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

/// Name and arguments of an action payload.
pub fn action_of(payload: &Value) -> Option<(&str, Vec<&str>)> {
    let name = payload.get("name")?.as_str()?;
    let args = payload
        .get("args")
        .and_then(Value::as_array)
        .map(|args| args.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    Some((name, args))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_helpers() {
        let fields = form_fields(&json!({"username": "amina", "remember": true}));
        assert_eq!(fields.len(), 1);
        assert_eq!(fields["username"], "amina");

        let payload = json!({"name": "add", "args": ["COKE", 2]});
        let (name, args) = action_of(&payload).unwrap();
        assert_eq!(name, "add");
        assert_eq!(args, vec!["COKE"]);
        assert!(action_of(&json!({"args": []})).is_none());
    }
}
