//! # Subscriptions
//!
//! Subscriber registry and the handle returned by `subscribe`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde_json::Value;

use crate::manager::StateSnapshot;

/// Per-key subscriber: `(new_value, old_value)`.
pub type KeyCallback = Arc<dyn Fn(Option<&Value>, Option<&Value>) + Send + Sync>;

/// Wildcard subscriber: `(key, new_value, old_value, full_snapshot)`.
pub type WildcardCallback =
    Arc<dyn Fn(&str, Option<&Value>, Option<&Value>, &StateSnapshot) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Topic {
    Key(String),
    All,
}

#[derive(Default)]
pub(crate) struct Registry {
    next_id: u64,
    keyed: HashMap<String, Vec<(u64, KeyCallback)>>,
    wildcard: Vec<(u64, WildcardCallback)>,
}

impl Registry {
    pub(crate) fn add_key(&mut self, key: &str, callback: KeyCallback) -> u64 {
        let id = self.bump();
        self.keyed
            .entry(key.to_string())
            .or_default()
            .push((id, callback));
        id
    }

    pub(crate) fn add_wildcard(&mut self, callback: WildcardCallback) -> u64 {
        let id = self.bump();
        self.wildcard.push((id, callback));
        id
    }

    /// Subscribers for `key` in subscription order, plus wildcard subscribers.
    pub(crate) fn listeners(&self, key: &str) -> (Vec<KeyCallback>, Vec<WildcardCallback>) {
        let keyed = self
            .keyed
            .get(key)
            .map(|subs| subs.iter().map(|(_, cb)| cb.clone()).collect())
            .unwrap_or_default();
        let wildcard = self.wildcard.iter().map(|(_, cb)| cb.clone()).collect();
        (keyed, wildcard)
    }

    pub(crate) fn count(&self, key: &str) -> usize {
        self.keyed.get(key).map_or(0, Vec::len)
    }

    fn remove(&mut self, topic: &Topic, id: u64) {
        match topic {
            Topic::Key(key) => {
                if let Some(subs) = self.keyed.get_mut(key) {
                    subs.retain(|(sub_id, _)| *sub_id != id);
                    if subs.is_empty() {
                        self.keyed.remove(key);
                    }
                }
            }
            Topic::All => self.wildcard.retain(|(sub_id, _)| *sub_id != id),
        }
    }

    fn bump(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Handle for an active subscription.
///
/// Dropping the handle does NOT unsubscribe; call [`Subscription::unsubscribe`].
#[must_use = "keep the handle to be able to unsubscribe"]
pub struct Subscription {
    id: u64,
    topic: Topic,
    registry: Weak<Mutex<Registry>>,
    active: AtomicBool,
}

impl Subscription {
    pub(crate) fn new(id: u64, topic: Topic, registry: &Arc<Mutex<Registry>>) -> Self {
        Subscription {
            id,
            topic,
            registry: Arc::downgrade(registry),
            active: AtomicBool::new(true),
        }
    }

    /// Removes the subscriber. Calling it again is a no-op.
    pub fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            registry.lock().remove(&self.topic, self.id);
        }
    }

    /// True until `unsubscribe` has been called.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("topic", &self.topic)
            .field("active", &self.is_active())
            .finish()
    }
}
