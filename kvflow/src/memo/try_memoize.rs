//! Memoizer for fallible async functions.

use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use super::{ComputeMode, KeyedLocks};
use crate::errors::MemoError;
use crate::resolver::{singleton, try_singleton_with};
use crate::store::InMemoryStore;

/// An async, fallible function wrapped with an async cache.
///
/// Only successful results are stored; a failed call leaves the cache
/// untouched so the next call for the same input tries again.
pub struct AsyncTryMemo<T, R, F> {
    f: F,
    store: Arc<InMemoryStore<T, R>>,
    mode: ComputeMode,
    locks: KeyedLocks<T>,
}

impl<T, R, E, F, Fut> AsyncTryMemo<T, R, F>
where
    T: Eq + Hash + Clone + Send + Sync,
    R: Clone + Send,
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<R, E>>,
{
    /// Wraps `f` using the given evaluation mode.
    pub fn with_mode(f: F, mode: ComputeMode) -> Self {
        Self {
            f,
            store: Arc::new(InMemoryStore::new()),
            mode,
            locks: KeyedLocks::new(),
        }
    }

    /// Returns the evaluation mode.
    #[must_use]
    pub const fn mode(&self) -> ComputeMode {
        self.mode
    }

    /// Returns the backing store.
    #[must_use]
    pub const fn store(&self) -> &Arc<InMemoryStore<T, R>> {
        &self.store
    }

    /// Returns the memoized result for `x`, computing it if needed.
    pub async fn call(&self, x: T) -> Result<R, MemoError<E>> {
        match self.mode {
            ComputeMode::Lazy => {
                try_singleton_with(x.clone(), self.store.as_ref(), || (self.f)(x)).await
            }
            ComputeMode::Eager => {
                let candidate = (self.f)(x.clone()).await.map_err(MemoError::Compute)?;
                Ok(singleton(x, candidate, self.store.as_ref()).await?)
            }
            ComputeMode::SingleFlight => {
                let _guard = self.locks.lock(&x).await;
                try_singleton_with(x.clone(), self.store.as_ref(), || (self.f)(x)).await
            }
        }
    }
}

impl<T: Eq + Hash, R, F> fmt::Debug for AsyncTryMemo<T, R, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncTryMemo")
            .field("mode", &self.mode)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
