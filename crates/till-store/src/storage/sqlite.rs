//! SQLite-backed storage.
//!
//! ## Schema
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  kv_store                                                               │
//! │  ─────────────────────────────────────────────────────────────────      │
//! │  key TEXT PRIMARY KEY │ value TEXT NOT NULL │ updated_at TEXT NOT NULL  │
//! │  till.user            │ {"id":1,...}        │ 2026-10-14T09:12:03Z      │
//! │  till.theme           │ "dark"              │ 2026-10-14T09:12:05Z      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Writes are synchronous so a persisted key is on disk by the time
//! `set_state` returns.

use std::path::Path;

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use super::Storage;
use crate::error::StoreResult;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
)";

/// Key/value storage in a single SQLite table.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Opens (or creates) the database file and ensures the schema exists.
    ///
    /// Parent directories are created as needed.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!(journal_mode = %mode, "SQLite journal mode set");

        info!(?path, "Opened state storage");
        Self::with_connection(conn)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute(SCHEMA, [])?;
        Ok(SqliteStorage {
            conn: Mutex::new(conn),
        })
    }

    /// Number of stored entries.
    pub fn len(&self) -> StoreResult<usize> {
        let count: i64 = self
            .conn
            .lock()
            .query_row("SELECT COUNT(*) FROM kv_store", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

impl Storage for SqliteStorage {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let value = self
            .conn
            .lock()
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.conn.lock().execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.conn
            .lock()
            .execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        Ok(())
    }
}

impl std::fmt::Debug for SqliteStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStorage").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_round_trip() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        assert_eq!(storage.get("till.user").unwrap(), None);

        storage.set("till.user", r#"{"id":1}"#).unwrap();
        storage.set("till.user", r#"{"id":2}"#).unwrap();
        assert_eq!(storage.get("till.user").unwrap().as_deref(), Some(r#"{"id":2}"#));
        assert_eq!(storage.len().unwrap(), 1);

        storage.remove("till.user").unwrap();
        assert_eq!(storage.get("till.user").unwrap(), None);
    }

    #[test]
    fn test_file_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.db");

        {
            let storage = SqliteStorage::open(&path).unwrap();
            storage.set("till.theme", "\"dark\"").unwrap();
        }

        let reopened = SqliteStorage::open(&path).unwrap();
        assert_eq!(reopened.get("till.theme").unwrap().as_deref(), Some("\"dark\""));
    }
}
