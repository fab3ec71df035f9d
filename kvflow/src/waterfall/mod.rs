//! Retrying sequential pipelines.
//!
//! This module provides:
//! - [`Waterfall`], a typed chain of async steps where each step consumes
//!   the previous step's output
//! - [`RetryConfig`] and [`with_retry`], the per-step retry policy
//! - [`WaterfallState`], the observable state machine of one run

mod pipeline;
mod retry;
mod state;

pub use pipeline::{boxed_step, run_waterfall, run_waterfall_with, BoxedStep, Waterfall};
pub use retry::{
    should_retry, with_retry, BackoffStrategy, JitterStrategy, RetryConfig, RetryDecision,
    RetryExhausted, RetryState, DEFAULT_DELAY_MS, DEFAULT_MAX_ATTEMPTS,
};
pub use state::WaterfallState;
