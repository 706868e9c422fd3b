//! # History Host
//!
//! The router is constructed against anything that can report the current
//! path, push or replace an entry with opaque state, and announce
//! back/forward moves.
//!
//! ## MemoryHistory
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  entries:  [ "/" , "/login" , "/dashboard" , "/pos" ]                   │
//! │                                   ▲                                     │
//! │                                 cursor                                  │
//! │                                                                         │
//! │  push     : drop everything after cursor, append, cursor = last         │
//! │  replace  : overwrite entries[cursor]                                   │
//! │  back     : cursor - 1, emit PopState   (no-op at the first entry)      │
//! │  forward  : cursor + 1, emit PopState   (no-op at the last entry)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

/// One entry of the host history stack.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    /// Normalized target (path plus optional query).
    pub path: String,
    /// Opaque state attached at push/replace time.
    pub state: Option<Value>,
}

/// A back/forward move reported by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct PopState {
    /// Target the host moved to.
    pub path: String,
    /// State stored with that entry.
    pub state: Option<Value>,
}

/// Browser history capability.
pub trait HistoryHost: Send + Sync {
    /// Current location (path plus optional query).
    fn current_path(&self) -> String;

    /// Pushes a new entry.
    fn push(&self, path: &str, state: Option<Value>);

    /// Replaces the current entry.
    fn replace(&self, path: &str, state: Option<Value>);

    /// Moves back one entry. Returns `false` if there is nothing behind.
    fn back(&self) -> bool;

    /// Moves forward one entry. Returns `false` if there is nothing ahead.
    fn forward(&self) -> bool;

    /// Subscribes to back/forward moves.
    fn subscribe_pop(&self) -> mpsc::UnboundedReceiver<PopState>;
}

#[derive(Debug)]
struct Stack {
    entries: Vec<HistoryEntry>,
    cursor: usize,
    listeners: Vec<mpsc::UnboundedSender<PopState>>,
}

impl Stack {
    fn emit(&mut self) {
        let entry = &self.entries[self.cursor];
        let pop = PopState {
            path: entry.path.clone(),
            state: entry.state.clone(),
        };
        self.listeners.retain(|tx| tx.send(pop.clone()).is_ok());
    }
}

/// In-process history stack.
#[derive(Debug)]
pub struct MemoryHistory {
    stack: Mutex<Stack>,
}

impl MemoryHistory {
    /// Creates a stack holding a single entry for `initial_path`.
    pub fn new(initial_path: impl Into<String>) -> Self {
        MemoryHistory {
            stack: Mutex::new(Stack {
                entries: vec![HistoryEntry {
                    path: initial_path.into(),
                    state: None,
                }],
                cursor: 0,
                listeners: Vec::new(),
            }),
        }
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.stack.lock().entries.clone()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.stack.lock().entries.len()
    }

    /// Always false; the stack starts with one entry.
    pub fn is_empty(&self) -> bool {
        self.stack.lock().entries.is_empty()
    }

    /// The entry under the cursor.
    pub fn current(&self) -> HistoryEntry {
        let stack = self.stack.lock();
        stack.entries[stack.cursor].clone()
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new("/")
    }
}

impl HistoryHost for MemoryHistory {
    fn current_path(&self) -> String {
        let stack = self.stack.lock();
        stack.entries[stack.cursor].path.clone()
    }

    fn push(&self, path: &str, state: Option<Value>) {
        let mut stack = self.stack.lock();
        let keep = stack.cursor + 1;
        stack.entries.truncate(keep);
        stack.entries.push(HistoryEntry {
            path: path.to_string(),
            state,
        });
        stack.cursor = stack.entries.len() - 1;
        debug!(path, depth = stack.entries.len(), "History push");
    }

    fn replace(&self, path: &str, state: Option<Value>) {
        let mut stack = self.stack.lock();
        let cursor = stack.cursor;
        stack.entries[cursor] = HistoryEntry {
            path: path.to_string(),
            state,
        };
        debug!(path, "History replace");
    }

    fn back(&self) -> bool {
        let mut stack = self.stack.lock();
        if stack.cursor == 0 {
            return false;
        }
        stack.cursor -= 1;
        stack.emit();
        true
    }

    fn forward(&self) -> bool {
        let mut stack = self.stack.lock();
        if stack.cursor + 1 >= stack.entries.len() {
            return false;
        }
        stack.cursor += 1;
        stack.emit();
        true
    }

    fn subscribe_pop(&self) -> mpsc::UnboundedReceiver<PopState> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.stack.lock().listeners.push(tx);
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_push_truncates_forward_entries() {
        let history = MemoryHistory::new("/");
        history.push("/a", None);
        history.push("/b", None);
        assert!(history.back());
        history.push("/c", Some(json!({"from": "a"})));

        let paths: Vec<String> = history.entries().into_iter().map(|e| e.path).collect();
        assert_eq!(paths, vec!["/", "/a", "/c"]);
        assert!(!history.forward());
    }

    #[test]
    fn test_replace_overwrites_current() {
        let history = MemoryHistory::new("/admin");
        history.replace("/login", None);
        assert_eq!(history.len(), 1);
        assert_eq!(history.current_path(), "/login");
    }

    #[tokio::test]
    async fn test_back_and_forward_emit_pop_state() {
        let history = MemoryHistory::new("/");
        let mut pops = history.subscribe_pop();
        history.push("/pos", Some(json!(1)));

        assert!(history.back());
        assert_eq!(
            pops.recv().await,
            Some(PopState {
                path: "/".into(),
                state: None
            })
        );

        assert!(history.forward());
        assert_eq!(pops.recv().await.map(|p| p.state), Some(Some(json!(1))));

        assert!(!history.forward());
    }
}
