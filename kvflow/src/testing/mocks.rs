//! Test doubles for stores, memoized functions and waterfall steps.

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::errors::StoreError;
use crate::store::PromisedStore;

/// A shared call counter. Clones observe the same count.
#[derive(Debug, Clone, Default)]
pub struct CallCounter {
    count: Arc<AtomicUsize>,
}

impl CallCounter {
    /// Creates a counter at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one call and returns the new total.
    pub fn hit(&self) -> usize {
        self.count.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Returns the number of recorded calls.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Wraps `f` so every call is counted before it runs.
    pub fn wrap<A, R, F>(&self, f: F) -> impl Fn(&A) -> R
    where
        A: ?Sized,
        F: Fn(&A) -> R,
    {
        let counter = self.clone();
        move |arg: &A| {
            counter.hit();
            f(arg)
        }
    }
}

/// A step that fails a fixed number of times before succeeding.
///
/// Every failure is an [`anyhow::Error`] reading `flaky failure #N`, where
/// `N` is the call number.
#[derive(Debug, Clone)]
pub struct FlakyStep {
    failures: usize,
    value: i32,
    calls: CallCounter,
}

impl FlakyStep {
    /// Fails `failures` times, then yields `value` (or passes its input
    /// through, see [`FlakyStep::step_with_input`]).
    #[must_use]
    pub fn new(failures: usize, value: i32) -> Self {
        Self {
            failures,
            value,
            calls: CallCounter::new(),
        }
    }

    /// Returns the number of times the step has been invoked.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.count()
    }

    fn attempt(&self, success: i32) -> BoxFuture<'static, Result<i32, anyhow::Error>> {
        let n = self.calls.hit();
        let outcome = if n <= self.failures {
            Err(anyhow::anyhow!("flaky failure #{n}"))
        } else {
            Ok(success)
        };
        async move { outcome }.boxed()
    }

    /// A first step (no input) yielding the configured value.
    pub fn step(&self) -> impl Fn() -> BoxFuture<'static, Result<i32, anyhow::Error>> + Send + Sync + 'static {
        let this = self.clone();
        move || this.attempt(this.value)
    }

    /// A later step returning its input unchanged once it stops failing.
    pub fn step_with_input(
        &self,
    ) -> impl Fn(i32) -> BoxFuture<'static, Result<i32, anyhow::Error>> + Send + Sync + 'static {
        let this = self.clone();
        move |input| this.attempt(input)
    }
}

/// A store whose every operation fails with [`StoreError::Backend`].
#[derive(Debug, Clone)]
pub struct FailingStore {
    message: String,
    calls: CallCounter,
}

impl FailingStore {
    /// Creates a store failing with `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            calls: CallCounter::new(),
        }
    }

    /// Returns the number of operations attempted.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.count()
    }

    fn fail(&self) -> StoreError {
        self.calls.hit();
        StoreError::backend(self.message.clone())
    }
}

#[async_trait]
impl<K, V> PromisedStore<K, V> for FailingStore
where
    K: Send + Sync + 'static,
    V: Send + 'static,
{
    async fn get(&self, _key: &K) -> Result<V, StoreError> {
        Err(self.fail())
    }

    async fn set(&self, _key: K, _value: V) -> Result<(), StoreError> {
        Err(self.fail())
    }

    async fn delete(&self, _key: &K) -> Result<(), StoreError> {
        Err(self.fail())
    }
}
