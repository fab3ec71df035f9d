//! Error types for kvflow.
//!
//! Store operations fail with [`StoreError`], where
//! [`StoreError::MissingKey`] is the well-known identity for "key not
//! present". Waterfall pipelines surface [`WaterfallError`] only after a
//! step has exhausted its retries, and async memoizers wrap failures of
//! the memoized function in [`MemoError`].

use thiserror::Error;

/// The main error type for kvflow operations outside a single store call.
#[derive(Debug, Error)]
pub enum KvflowError {
    /// A store operation failed.
    #[error("{0}")]
    Store(#[from] StoreError),

    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failure outcome of a key-value store operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The requested key is not present in the store.
    #[error("missing key")]
    MissingKey,

    /// The backing store failed for a reason other than an absent key.
    #[error("Store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Creates a backend error.
    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }

    /// Returns true if this is the absent-key sentinel.
    #[must_use]
    pub const fn is_missing_key(&self) -> bool {
        matches!(self, Self::MissingKey)
    }
}

/// Error raised by a waterfall whose step exhausted its retries.
///
/// Values produced by earlier steps are dropped; only the last error of
/// the failing step is reported.
#[derive(Debug, Error)]
pub enum WaterfallError<E> {
    /// A step failed on every allowed attempt.
    #[error("step {step} failed after {attempts} attempt(s): {error}")]
    StepFailed {
        /// Zero-based index of the failing step.
        step: usize,
        /// Number of attempts made for that step.
        attempts: usize,
        /// Error returned by the final attempt.
        error: E,
    },
}

impl<E> WaterfallError<E> {
    /// Index of the step that failed.
    #[must_use]
    pub const fn step(&self) -> usize {
        match self {
            Self::StepFailed { step, .. } => *step,
        }
    }

    /// Number of attempts made before giving up.
    #[must_use]
    pub const fn attempts(&self) -> usize {
        match self {
            Self::StepFailed { attempts, .. } => *attempts,
        }
    }

    /// Returns the error of the final attempt.
    pub fn into_inner(self) -> E {
        match self {
            Self::StepFailed { error, .. } => error,
        }
    }
}

/// Error raised by a memoizer wrapping a fallible function.
#[derive(Debug, Error)]
pub enum MemoError<E> {
    /// The underlying store failed.
    #[error("{0}")]
    Store(#[from] StoreError),

    /// The memoized function itself failed. Nothing was cached.
    #[error("memoized computation failed: {0}")]
    Compute(E),
}

impl<E> MemoError<E> {
    /// Returns the computation error, if that is what failed.
    pub fn into_compute(self) -> Option<E> {
        match self {
            Self::Compute(e) => Some(e),
            Self::Store(_) => None,
        }
    }
}
