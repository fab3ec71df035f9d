//! Get-or-create resolution on top of a [`PromisedStore`].
//!
//! [`singleton`] returns the stored value for a key, or stores the given
//! default and returns it. Only [`StoreError::MissingKey`] triggers the
//! populate path; any other store failure is returned as-is.
//!
//! There is no atomic check-and-set: two resolvers racing on the same
//! absent key may both observe the miss and both write, in which case the
//! later write wins. [`crate::memo::ComputeMode::SingleFlight`] serializes
//! resolution per key for callers that need more.

use std::future::Future;

use crate::errors::{MemoError, StoreError};
use crate::store::PromisedStore;

/// Returns the value stored under `key`, storing `default` first if the key
/// is absent.
///
/// After a miss the store is written and then read again, so the result is
/// whatever the store holds at that point.
pub async fn singleton<K, V, S>(key: K, default: V, store: &S) -> Result<V, StoreError>
where
    S: PromisedStore<K, V> + ?Sized,
    K: Clone + Sync,
{
    singleton_with(key, store, move || default).await
}

/// Alias of [`singleton`] under its get-or-create name.
pub async fn resolve<K, V, S>(key: K, default: V, store: &S) -> Result<V, StoreError>
where
    S: PromisedStore<K, V> + ?Sized,
    K: Clone + Sync,
{
    singleton(key, default, store).await
}

/// Like [`singleton`], but only builds the default when the key is absent.
pub async fn singleton_with<K, V, S, F>(key: K, store: &S, make: F) -> Result<V, StoreError>
where
    S: PromisedStore<K, V> + ?Sized,
    K: Clone + Sync,
    F: FnOnce() -> V,
{
    match store.get(&key).await {
        Ok(value) => Ok(value),
        Err(StoreError::MissingKey) => {
            tracing::trace!("singleton miss, populating");
            store.set(key.clone(), make()).await?;
            store.get(&key).await
        }
        Err(e) => Err(e),
    }
}

/// Like [`singleton_with`], for defaults produced by a fallible async
/// computation. A failed computation stores nothing.
pub async fn try_singleton_with<K, V, S, F, Fut, E>(
    key: K,
    store: &S,
    make: F,
) -> Result<V, MemoError<E>>
where
    S: PromisedStore<K, V> + ?Sized,
    K: Clone + Sync,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<V, E>>,
{
    match store.get(&key).await {
        Ok(value) => Ok(value),
        Err(StoreError::MissingKey) => {
            tracing::trace!("singleton miss, computing");
            let value = make().await.map_err(MemoError::Compute)?;
            store.set(key.clone(), value).await?;
            Ok(store.get(&key).await?)
        }
        Err(e) => Err(MemoError::Store(e)),
    }
}
