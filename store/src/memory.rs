//! In-memory store implementation for testing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::{LocalStore, StoreError, StoreResult};

/// An in-memory store backed by a HashMap.
///
/// Cloning yields a handle to the same underlying map, so a test can keep
/// a handle and inspect what the session layer wrote.
#[derive(Clone)]
pub struct MemoryStore {
    data: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns the number of stored keys.
    pub fn len(&self) -> usize {
        self.data.lock().map(|d| d.len()).unwrap_or(0)
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let data = self
            .data
            .lock()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(data.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        let mut data = self
            .data
            .lock()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        data.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        let mut data = self
            .data
            .lock()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        data.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys;

    #[test]
    fn test_memory_roundtrip() {
        let store = MemoryStore::new();

        store.set(keys::TOKEN, b"tok-123").unwrap();
        assert_eq!(store.get(keys::TOKEN).unwrap(), Some(b"tok-123".to_vec()));

        store.delete(keys::TOKEN).unwrap();
        assert_eq!(store.get(keys::TOKEN).unwrap(), None);
    }

    #[test]
    fn test_memory_missing_key_is_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get("absent").unwrap(), None);
        // deleting an absent key is a no-op
        store.delete("absent").unwrap();
    }

    #[test]
    fn test_memory_clone_shares_data() {
        let store = MemoryStore::new();
        let handle = store.clone();

        store.set(keys::IDENTITY, b"{}").unwrap();
        assert_eq!(handle.get(keys::IDENTITY).unwrap(), Some(b"{}".to_vec()));
        assert_eq!(handle.len(), 1);
    }
}
