use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::{CacheStore, CacheStoreError};

/// A [`CacheStore`] held in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, String>>, CacheStoreError> {
        self.entries.lock().map_err(|_| CacheStoreError::Poisoned)
    }

    /// Remove `key`. Returns `true` if it was present.
    ///
    /// # Errors
    ///
    /// [`CacheStoreError::Poisoned`] if the lock is poisoned.
    pub fn remove(&self, key: &str) -> Result<bool, CacheStoreError> {
        Ok(self.lock()?.remove(key).is_some())
    }

    /// Drop every entry.
    ///
    /// # Errors
    ///
    /// [`CacheStoreError::Poisoned`] if the lock is poisoned.
    pub fn clear(&self) -> Result<(), CacheStoreError> {
        self.lock()?.clear();
        Ok(())
    }

    /// Number of stored entries.
    ///
    /// # Errors
    ///
    /// [`CacheStoreError::Poisoned`] if the lock is poisoned.
    pub fn len(&self) -> Result<usize, CacheStoreError> {
        Ok(self.lock()?.len())
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, CacheStoreError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheStoreError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
