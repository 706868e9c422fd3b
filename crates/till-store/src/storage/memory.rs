use std::collections::HashMap;

use parking_lot::Mutex;

use super::Storage;
use crate::error::StoreResult;

/// In-memory storage.
///
/// Cloning the `Arc` that wraps it is how tests "reload the page" against
/// the same storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Creates empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// True if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.entries
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("till.theme").unwrap(), None);

        storage.set("till.theme", "\"dark\"").unwrap();
        assert_eq!(storage.get("till.theme").unwrap().as_deref(), Some("\"dark\""));

        storage.remove("till.theme").unwrap();
        storage.remove("till.theme").unwrap();
        assert!(storage.is_empty());
    }
}
