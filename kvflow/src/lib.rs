//! # Kvflow
//!
//! Small async building blocks around a promise-returning key-value store.
//!
//! Kvflow provides:
//!
//! - **Async store**: a [`PromisedStore`](store::PromisedStore) trait with an
//!   in-memory implementation where absent keys surface as
//!   [`StoreError::MissingKey`](errors::StoreError::MissingKey)
//! - **Singleton resolution**: get-or-create on top of any store
//! - **Memoization**: store-backed caching of plain and async functions, in
//!   lazy, eager or single-flight mode
//! - **Retrying waterfalls**: typed sequential pipelines where each step is
//!   retried up to three times, two seconds apart, before the run stops
//! - **Lazy sequences**: restartable filter and map adapters
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use kvflow::prelude::*;
//!
//! let store = make_store::<String, u32>();
//! let hits = singleton("hits".to_string(), 0, &store).await?;
//!
//! let total = Waterfall::new(|| async { fetch_count().await })
//!     .then(|count: u32| async move { save(count).await })
//!     .run()
//!     .await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod errors;
pub mod events;
pub mod lazy;
pub mod memo;
pub mod observability;
pub mod resolver;
pub mod store;
pub mod testing;
pub mod waterfall;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::KvflowConfig;
    pub use crate::errors::{KvflowError, MemoError, StoreError, WaterfallError};
    pub use crate::events::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::lazy::{lazy_filter, lazy_map, LazyFilter, LazyMap};
    pub use crate::memo::{
        memoize, memoize_async, memoize_eager, memoize_with, AsyncMemo, AsyncTryMemo,
        ComputeMode, MemoConfig,
    };
    pub use crate::resolver::{resolve, singleton, singleton_with, try_singleton_with};
    pub use crate::store::{get_all, make_store, InMemoryStore, PromisedStore};
    pub use crate::waterfall::{
        run_waterfall, run_waterfall_with, BackoffStrategy, JitterStrategy, RetryConfig,
        Waterfall, WaterfallState,
    };
}
