//! # Durable Storage
//!
//! Key/value persistence with browser local-storage semantics: string keys,
//! string values, synchronous reads and writes.
//!
//! ## Backends
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Backend          Lifetime               Used by                        │
//! │  ───────          ────────               ───────                        │
//! │  MemoryStorage    process                tests, `backend = "memory"`    │
//! │  SqliteStorage    file on disk (WAL)     shell default                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod memory;
mod sqlite;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

use crate::error::StoreResult;

/// Durable key/value storage.
pub trait Storage: Send + Sync {
    /// Reads a value; `Ok(None)` if the key is absent.
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Writes a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Removes a value. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> StoreResult<()>;
}
