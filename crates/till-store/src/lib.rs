//! # till-store: State Store for the Till POS Shell
//!
//! Page-lifetime key/value state with change notification, a bounded change
//! history, bulk clearing of sensitive keys and write-through persistence.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          till-store                                     │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                      StateManager                               │   │
//! │  │                                                                 │   │
//! │  │  set_state ──► equal? ──yes──► no-op                            │   │
//! │  │                  │no                                            │   │
//! │  │                  ▼                                              │   │
//! │  │           history.push ──► key subscribers ──► wildcard subs    │   │
//! │  │                                                   │             │   │
//! │  │                                                   ▼             │   │
//! │  │                                  persisted key? ──► Storage     │   │
//! │  └─────────────────────────────────────────────────────┬───────────┘   │
//! │                                                        │                │
//! │  ┌─────────────────────────────────────────────────────▼───────────┐   │
//! │  │                    Storage (trait)                              │   │
//! │  │     MemoryStorage  │  SqliteStorage (rusqlite, kv_store)        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use std::sync::Arc;
//! use serde_json::json;
//! use till_store::{StateManager, StoreConfig, MemoryStorage};
//!
//! let store = StateManager::new(StoreConfig::default(), Arc::new(MemoryStorage::new()));
//!
//! let sub = store.subscribe("theme", |new, _old| {
//!     println!("theme is now {:?}", new);
//! });
//!
//! assert!(store.set_state("theme", json!("dark")));
//! assert!(!store.set_state("theme", json!("dark"))); // equal value: no-op
//!
//! sub.unsubscribe();
//! ```

pub mod config;
pub mod error;
pub mod history;
pub mod manager;
pub mod storage;
pub mod subscription;

pub use config::{StoreConfig, ValidationPolicy};
pub use error::{StoreError, StoreResult};
pub use history::StateChange;
pub use manager::{StateManager, StateSnapshot};
pub use storage::{MemoryStorage, SqliteStorage, Storage};
pub use subscription::Subscription;
