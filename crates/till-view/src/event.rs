//! # Event Targets
//!
//! Named UI elements that dispatch events to registered listeners.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  EventTarget "form#login"                                               │
//! │    "submit" ──► [ (id 1, cb), (id 4, cb) ]                              │
//! │    "input"  ──► [ (id 2, cb) ]                                          │
//! │                                                                         │
//! │  dispatch("submit", payload) calls listeners in registration order,     │
//! │  outside the lock, so a listener may remove itself.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

/// Listener callback; receives the event payload.
pub type Listener = Arc<dyn Fn(&Value) + Send + Sync>;

/// Identifies one registration on a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
struct Listeners {
    next_id: u64,
    by_event: HashMap<String, Vec<(ListenerId, Listener)>>,
}

/// An element that events are dispatched on.
pub struct EventTarget {
    name: String,
    listeners: Mutex<Listeners>,
}

impl EventTarget {
    pub fn new(name: impl Into<String>) -> Self {
        EventTarget {
            name: name.into(),
            listeners: Mutex::new(Listeners::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds a listener for `event`.
    pub fn add_listener<F>(&self, event: &str, listener: F) -> ListenerId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let mut listeners = self.listeners.lock();
        listeners.next_id += 1;
        let id = ListenerId(listeners.next_id);
        listeners
            .by_event
            .entry(event.to_string())
            .or_default()
            .push((id, Arc::new(listener)));
        id
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub fn remove_listener(&self, event: &str, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let Some(list) = listeners.by_event.get_mut(event) else {
            return false;
        };
        let before = list.len();
        list.retain(|(listener_id, _)| *listener_id != id);
        let removed = list.len() != before;
        if list.is_empty() {
            listeners.by_event.remove(event);
        }
        removed
    }

    /// Dispatches `event`; returns how many listeners ran.
    pub fn dispatch(&self, event: &str, payload: &Value) -> usize {
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .by_event
            .get(event)
            .map(|list| list.iter().map(|(_, l)| l.clone()).collect())
            .unwrap_or_default();

        for listener in &listeners {
            listener(payload);
        }
        listeners.len()
    }

    /// Listeners registered for `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.lock().by_event.get(event).map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for EventTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventTarget")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_add_dispatch_remove() {
        let target = EventTarget::new("button#pay");
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let id = target.add_listener("click", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(target.dispatch("click", &json!({})), 1);
        assert_eq!(target.dispatch("keyup", &json!({})), 0);

        assert!(target.remove_listener("click", id));
        assert!(!target.remove_listener("click", id));
        assert_eq!(target.dispatch("click", &json!({})), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
