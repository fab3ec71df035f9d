//! Per-key async locks.

use dashmap::DashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// A set of async mutexes, one per key, created on first use.
///
/// Holding the guard returned by [`KeyedLocks::lock`] excludes every other
/// caller locking an equal key. Locks for different keys are independent.
/// Entries live as long as the set itself.
pub struct KeyedLocks<K> {
    locks: DashMap<K, Arc<Mutex<()>>>,
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    /// Creates an empty lock set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// Waits for exclusive access to `key`.
    pub async fn lock(&self, key: &K) -> OwnedMutexGuard<()> {
        // The map shard guard must be released before awaiting.
        let lock = Arc::clone(&self.locks.entry(key.clone()).or_default());
        lock.lock_owned().await
    }

    /// Returns the number of keys that have been locked at least once.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Returns true if no key has been locked yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl<K: Eq + Hash + Clone> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash> fmt::Debug for KeyedLocks<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedLocks")
            .field("keys", &self.locks.len())
            .finish()
    }
}
