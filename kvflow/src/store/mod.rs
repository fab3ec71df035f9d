//! Asynchronous key-value storage.
//!
//! [`PromisedStore`] is the storage protocol: every operation returns a
//! future so an in-memory map and a slow or remote backend are
//! interchangeable. [`InMemoryStore`] is the in-process implementation.
//!
//! Absent keys are always reported as [`StoreError::MissingKey`], both by
//! `get` and by `delete`.

mod memory;

pub use memory::InMemoryStore;

use async_trait::async_trait;

use crate::errors::StoreError;

/// Protocol for asynchronous key-value storage backends.
#[async_trait]
pub trait PromisedStore<K, V>: Send + Sync {
    /// Gets the value stored under `key`.
    ///
    /// Fails with [`StoreError::MissingKey`] if the key is absent.
    async fn get(&self, key: &K) -> Result<V, StoreError>;

    /// Stores `value` under `key`, overwriting any previous value.
    async fn set(&self, key: K, value: V) -> Result<(), StoreError>;

    /// Removes `key` from the store.
    ///
    /// Fails with [`StoreError::MissingKey`] if the key is absent.
    async fn delete(&self, key: &K) -> Result<(), StoreError>;
}

/// Creates a new, empty, independent in-memory store.
#[must_use]
pub fn make_store<K, V>() -> InMemoryStore<K, V> {
    InMemoryStore::new()
}

/// Reads several keys in order.
///
/// Fails with the first error encountered. An empty key list fails with
/// [`StoreError::MissingKey`] since there is nothing to resolve.
pub async fn get_all<K, V, S>(store: &S, keys: &[K]) -> Result<Vec<V>, StoreError>
where
    S: PromisedStore<K, V> + ?Sized,
    K: Sync,
{
    if keys.is_empty() {
        return Err(StoreError::MissingKey);
    }

    let mut values = Vec::with_capacity(keys.len());
    for key in keys {
        values.push(store.get(key).await?);
    }
    Ok(values)
}
