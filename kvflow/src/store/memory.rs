//! In-memory implementation of [`PromisedStore`].

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use super::PromisedStore;
use crate::errors::StoreError;

/// In-memory key-value store.
///
/// Simple hash map based storage. Each operation runs to completion under
/// a single lock acquisition, so a `set` or `delete` is never observed
/// half-applied. The lock is never held across an await point.
pub struct InMemoryStore<K, V> {
    entries: Mutex<HashMap<K, V>>,
}

impl<K, V> InMemoryStore<K, V> {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl<K: Eq + Hash, V> InMemoryStore<K, V> {
    /// Returns true if `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.lock().contains_key(key)
    }
}

impl<K, V> Default for InMemoryStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for InMemoryStore<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("len", &self.len())
            .finish()
    }
}

#[async_trait]
impl<K, V> PromisedStore<K, V> for InMemoryStore<K, V>
where
    K: Eq + Hash + Send + Sync,
    V: Clone + Send,
{
    async fn get(&self, key: &K) -> Result<V, StoreError> {
        self.entries
            .lock()
            .get(key)
            .cloned()
            .ok_or(StoreError::MissingKey)
    }

    async fn set(&self, key: K, value: V) -> Result<(), StoreError> {
        let replaced = self.entries.lock().insert(key, value).is_some();
        tracing::trace!(replaced, "store.set");
        Ok(())
    }

    async fn delete(&self, key: &K) -> Result<(), StoreError> {
        if self.entries.lock().remove(key).is_some() {
            Ok(())
        } else {
            tracing::trace!("store.delete on missing key");
            Err(StoreError::MissingKey)
        }
    }
}
