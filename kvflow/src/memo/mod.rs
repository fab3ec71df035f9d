//! Memoization backed by an async key-value store.
//!
//! Each memoizer owns one [`InMemoryStore`](crate::store::InMemoryStore)
//! created at construction time, keyed by input and holding outputs.
//! Entries are never evicted.
//!
//! Three evaluation modes are available:
//! - [`ComputeMode::Lazy`] (default): the function runs only on a cache miss.
//! - [`ComputeMode::Eager`]: the function runs on every call and the cached
//!   value, if any, wins over the fresh one.
//! - [`ComputeMode::SingleFlight`]: like `Lazy`, with concurrent calls for
//!   the same input serialized so the function runs once per input.

mod memoize;
mod single_flight;
mod try_memoize;

pub use memoize::AsyncMemo;
pub use single_flight::KeyedLocks;
pub use try_memoize::AsyncTryMemo;

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::hash::Hash;

/// When the memoized function is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComputeMode {
    /// Evaluate only on a cache miss.
    #[default]
    Lazy,
    /// Evaluate on every call; keep the first stored value.
    Eager,
    /// Evaluate only on a cache miss, one caller per input at a time.
    SingleFlight,
}

/// Configuration for memoizers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoConfig {
    /// Evaluation mode.
    #[serde(default)]
    pub mode: ComputeMode,
}

impl MemoConfig {
    /// Creates a new memo config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the evaluation mode.
    #[must_use]
    pub const fn with_mode(mut self, mode: ComputeMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Memoizes `f`, evaluating it only on cache misses.
pub fn memoize<T, R, F>(f: F) -> AsyncMemo<T, R, F>
where
    T: Eq + Hash + Clone + Send + Sync,
    R: Clone + Send,
    F: Fn(&T) -> R,
{
    AsyncMemo::with_mode(f, ComputeMode::Lazy)
}

/// Memoizes `f`, evaluating it on every call.
///
/// The result for a given input is still stable after the first call, but
/// nothing is saved in computation cost.
pub fn memoize_eager<T, R, F>(f: F) -> AsyncMemo<T, R, F>
where
    T: Eq + Hash + Clone + Send + Sync,
    R: Clone + Send,
    F: Fn(&T) -> R,
{
    AsyncMemo::with_mode(f, ComputeMode::Eager)
}

/// Memoizes `f` using the mode from `config`.
pub fn memoize_with<T, R, F>(f: F, config: &MemoConfig) -> AsyncMemo<T, R, F>
where
    T: Eq + Hash + Clone + Send + Sync,
    R: Clone + Send,
    F: Fn(&T) -> R,
{
    AsyncMemo::with_mode(f, config.mode)
}

/// Memoizes a fallible async function. Failed calls are not cached.
pub fn memoize_async<T, R, E, F, Fut>(f: F) -> AsyncTryMemo<T, R, F>
where
    T: Eq + Hash + Clone + Send + Sync,
    R: Clone + Send,
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<R, E>>,
{
    AsyncTryMemo::with_mode(f, ComputeMode::Lazy)
}
