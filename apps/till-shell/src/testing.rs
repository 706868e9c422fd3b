//! In-memory app wiring for tests.

use std::sync::Arc;

use serde_json::json;
use till_core::RecordingChrome;
use till_router::{MemoryHistory, Router};
use till_store::StateManager;
use till_view::{MemoryApi, MemoryMount, NotificationCenter};

use crate::app::App;
use crate::context::{AppContext, TOKEN_KEY, USER_KEY};

pub(crate) struct Harness {
    pub app: App,
    pub api: Arc<MemoryApi>,
    pub mount: Arc<MemoryMount>,
    pub chrome: Arc<RecordingChrome>,
    pub history: Arc<MemoryHistory>,
    pub center: Arc<NotificationCenter>,
}

pub(crate) fn harness() -> Harness {
    let api = Arc::new(MemoryApi::new());
    let mount = Arc::new(MemoryMount::new());
    let chrome = Arc::new(RecordingChrome::new());
    let history = Arc::new(MemoryHistory::new("/"));
    let center = Arc::new(NotificationCenter::default());

    let router = Router::new(history.clone(), chrome.clone());
    let ctx = AppContext::new(
        Arc::new(StateManager::in_memory()),
        router,
        center.clone(),
        api.clone(),
        chrome.clone(),
        mount.clone(),
    );
    let app = App::new(ctx).unwrap();

    Harness {
        app,
        api,
        mount,
        chrome,
        history,
        center,
    }
}

pub(crate) fn sign_in(h: &Harness) {
    let state = &h.app.context().state;
    state.set_state(USER_KEY, json!({"username": "amina", "name": "Amina"}));
    state.set_state(TOKEN_KEY, json!("t-test"));
}
