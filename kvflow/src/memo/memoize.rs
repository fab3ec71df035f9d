//! Memoizer for synchronous functions.

use futures::future::{BoxFuture, FutureExt};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use super::{ComputeMode, KeyedLocks};
use crate::errors::StoreError;
use crate::resolver::{singleton, singleton_with};
use crate::store::InMemoryStore;

/// A function wrapped with an async cache.
///
/// Calling [`AsyncMemo::call`] with an input seen before resolves from the
/// store. The returned value for a given input never changes once stored.
pub struct AsyncMemo<T, R, F> {
    f: F,
    store: Arc<InMemoryStore<T, R>>,
    mode: ComputeMode,
    locks: KeyedLocks<T>,
}

impl<T, R, F> AsyncMemo<T, R, F>
where
    T: Eq + Hash + Clone + Send + Sync,
    R: Clone + Send,
    F: Fn(&T) -> R,
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

    /// Returns the memoized result for `x`.
    pub async fn call(&self, x: T) -> Result<R, StoreError> {
        match self.mode {
            ComputeMode::Lazy => singleton_with(x.clone(), self.store.as_ref(), || (self.f)(&x)).await,
            ComputeMode::Eager => {
                let candidate = (self.f)(&x);
                singleton(x, candidate, self.store.as_ref()).await
            }
            ComputeMode::SingleFlight => {
                let _guard = self.locks.lock(&x).await;
                singleton_with(x.clone(), self.store.as_ref(), || (self.f)(&x)).await
            }
        }
    }

    /// Converts the memoizer into a plain function returning boxed futures.
    pub fn into_fn(self) -> impl Fn(T) -> BoxFuture<'static, Result<R, StoreError>> + Send + Sync
    where
        T: 'static,
        R: 'static,
        F: Send + Sync + 'static,
    {
        let memo = Arc::new(self);
        move |x| {
            let memo = Arc::clone(&memo);
            async move { memo.call(x).await }.boxed()
        }
    }
}

impl<T: Eq + Hash, R, F> fmt::Debug for AsyncMemo<T, R, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncMemo")
            .field("mode", &self.mode)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
