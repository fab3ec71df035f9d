//! Testing utilities for stores, memoizers and waterfalls.
//!
//! This module provides:
//! - Call counters and flaky steps for driving retries
//! - A store that always fails, for error-propagation paths
//! - Assertions for store and waterfall results

mod assertions;
mod mocks;

pub use assertions::{
    assert_backend_error, assert_missing_key, assert_state, assert_step_failed,
};
pub use mocks::{CallCounter, FailingStore, FlakyStep};
