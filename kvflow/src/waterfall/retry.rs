//! Retry policy for waterfall steps.
//!
//! The default policy makes exactly three attempts with a fixed two second
//! pause between them and no jitter. Backoff growth and jitter are
//! available for callers that want them.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// Default number of attempts per step, including the first.
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;

/// Default pause between attempts, in milliseconds.
pub const DEFAULT_DELAY_MS: u64 = 2000;

/// Backoff strategy for retry delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// delay = base (constant)
    #[default]
    Constant,
    /// delay = base * retry
    Linear,
    /// delay = base * 2^(retry - 1)
    Exponential,
}

/// Jitter strategy applied on top of the backoff delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JitterStrategy {
    /// No jitter
    #[default]
    None,
    /// Random from 0 to delay
    Full,
    /// Half fixed, half random
    Equal,
}

/// Configuration for retry behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum attempts per step (including the first).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    /// Base delay between attempts in milliseconds.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Maximum delay cap in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Backoff strategy.
    #[serde(default)]
    pub backoff_strategy: BackoffStrategy,
    /// Jitter strategy.
    #[serde(default)]
    pub jitter_strategy: JitterStrategy,
}

const fn default_max_attempts() -> usize {
    DEFAULT_MAX_ATTEMPTS
}

const fn default_base_delay_ms() -> u64 {
    DEFAULT_DELAY_MS
}

const fn default_max_delay_ms() -> u64 {
    30_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_strategy: BackoffStrategy::Constant,
            jitter_strategy: JitterStrategy::None,
        }
    }
}

impl RetryConfig {
    /// Creates a new retry config with the fixed default policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum attempts. Values below one are treated as one.
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Sets the base delay.
    #[must_use]
    pub const fn with_base_delay_ms(mut self, delay: u64) -> Self {
        self.base_delay_ms = delay;
        self
    }

    /// Sets the maximum delay.
    #[must_use]
    pub const fn with_max_delay_ms(mut self, delay: u64) -> Self {
        self.max_delay_ms = delay;
        self
    }

    /// Sets the backoff strategy.
    #[must_use]
    pub const fn with_backoff(mut self, strategy: BackoffStrategy) -> Self {
        self.backoff_strategy = strategy;
        self
    }

    /// Sets the jitter strategy.
    #[must_use]
    pub const fn with_jitter(mut self, strategy: JitterStrategy) -> Self {
        self.jitter_strategy = strategy;
        self
    }
}

/// Attempt bookkeeping for one retried operation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RetryState {
    /// Number of failed attempts so far.
    pub attempt: usize,
}

impl RetryState {
    /// Creates a new retry state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failed attempt and returns true if another attempt is allowed.
    pub fn increment(&mut self, config: &RetryConfig) -> bool {
        self.attempt += 1;
        !self.is_exhausted(config)
    }

    /// Returns true if no attempts remain.
    #[must_use]
    pub fn is_exhausted(&self, config: &RetryConfig) -> bool {
        self.attempt >= config.max_attempts.max(1)
    }

    /// Calculates the pause before the next attempt.
    ///
    /// Expects at least one recorded failure; the first retry uses the
    /// base delay.
    #[must_use]
    pub fn calculate_delay(&self, config: &RetryConfig) -> Duration {
        let base = config.base_delay_ms;
        let max = config.max_delay_ms.max(base);
        let retry = u64::try_from(self.attempt.max(1)).unwrap_or(u64::MAX);

        let delay = match config.backoff_strategy {
            BackoffStrategy::Constant => base,
            BackoffStrategy::Linear => base.saturating_mul(retry).min(max),
            BackoffStrategy::Exponential => {
                let exponent = u32::try_from(retry - 1).unwrap_or(u32::MAX);
                base.saturating_mul(2u64.saturating_pow(exponent)).min(max)
            }
        };

        let jittered = match config.jitter_strategy {
            JitterStrategy::None => delay,
            JitterStrategy::Full => {
                if delay == 0 {
                    0
                } else {
                    rand::thread_rng().gen_range(0..=delay)
                }
            }
            JitterStrategy::Equal => {
                let half = delay / 2;
                if half == 0 {
                    delay
                } else {
                    half + rand::thread_rng().gen_range(0..=half)
                }
            }
        };

        Duration::from_millis(jittered)
    }
}

/// Outcome of a retry decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the specified delay.
    Retry(Duration),
    /// No more retries, give up.
    GiveUp,
}

/// Records a failure and decides whether to try again.
#[must_use]
pub fn should_retry(state: &mut RetryState, config: &RetryConfig) -> RetryDecision {
    if state.increment(config) {
        RetryDecision::Retry(state.calculate_delay(config))
    } else {
        RetryDecision::GiveUp
    }
}

/// A retried operation that ran out of attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryExhausted<E> {
    /// Attempts made.
    pub attempts: usize,
    /// Error of the final attempt.
    pub error: E,
}

/// Executes an operation with retry logic.
///
/// `on_retry` is called with the failed attempt number, the delay about to
/// be waited and the error, before each pause.
pub async fn with_retry<T, E, F, Fut, R>(
    config: &RetryConfig,
    mut operation: F,
    mut on_retry: R,
) -> Result<T, RetryExhausted<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: FnMut(usize, Duration, &E),
{
    let mut state = RetryState::new();

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => match should_retry(&mut state, config) {
                RetryDecision::Retry(delay) => {
                    on_retry(state.attempt, delay, &e);
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::GiveUp => {
                    return Err(RetryExhausted {
                        attempts: state.attempt,
                        error: e,
                    });
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_retry_config_default_is_fixed_policy() {
        let config = RetryConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.base_delay_ms, 2000);
        assert_eq!(config.backoff_strategy, BackoffStrategy::Constant);
        assert_eq!(config.jitter_strategy, JitterStrategy::None);
    }

    #[test]
    fn test_retry_config_builder() {
        let config = RetryConfig::new()
            .with_max_attempts(5)
            .with_base_delay_ms(500)
            .with_max_delay_ms(10000)
            .with_backoff(BackoffStrategy::Linear)
            .with_jitter(JitterStrategy::Full);

        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.base_delay_ms, 500);
        assert_eq!(config.max_delay_ms, 10000);
        assert_eq!(config.backoff_strategy, BackoffStrategy::Linear);
        assert_eq!(config.jitter_strategy, JitterStrategy::Full);
    }

    #[test]
    fn test_zero_attempts_clamped_to_one() {
        let config = RetryConfig::new().with_max_attempts(0);
        assert_eq!(config.max_attempts, 1);
    }

    #[test]
    fn test_retry_config_deserialize_partial() {
        let config: RetryConfig = serde_json::from_str(r#"{"base_delay_ms": 10}"#).unwrap();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.base_delay_ms, 10);
        assert_eq!(config.backoff_strategy, BackoffStrategy::Constant);
    }

    #[test]
    fn test_retry_state_increment() {
        let config = RetryConfig::new();
        let mut state = RetryState::new();

        assert_eq!(state.attempt, 0);
        assert!(state.increment(&config)); // 1
        assert!(state.increment(&config)); // 2
        assert!(!state.increment(&config)); // 3, exhausted
        assert!(state.is_exhausted(&config));
    }

    #[test]
    fn test_constant_delay() {
        let config = RetryConfig::new();
        let mut state = RetryState::new();

        for attempt in 1..=5 {
            state.attempt = attempt;
            assert_eq!(state.calculate_delay(&config), Duration::from_millis(2000));
        }
    }

    #[test]
    fn test_linear_and_exponential_delay() {
        let linear = RetryConfig::new()
            .with_base_delay_ms(100)
            .with_backoff(BackoffStrategy::Linear);
        let exponential = RetryConfig::new()
            .with_base_delay_ms(100)
            .with_backoff(BackoffStrategy::Exponential);
        let mut state = RetryState::new();

        state.attempt = 1;
        assert_eq!(state.calculate_delay(&linear), Duration::from_millis(100));
        assert_eq!(state.calculate_delay(&exponential), Duration::from_millis(100));

        state.attempt = 3;
        assert_eq!(state.calculate_delay(&linear), Duration::from_millis(300));
        assert_eq!(state.calculate_delay(&exponential), Duration::from_millis(400));
    }

    #[test]
    fn test_delay_capped_at_max() {
        let config = RetryConfig::new()
            .with_base_delay_ms(1000)
            .with_max_delay_ms(5000)
            .with_backoff(BackoffStrategy::Exponential);

        let state = RetryState { attempt: 10 };
        assert_eq!(state.calculate_delay(&config), Duration::from_millis(5000));
    }

    #[test]
    fn test_full_jitter_bounded() {
        let config = RetryConfig::new()
            .with_base_delay_ms(100)
            .with_jitter(JitterStrategy::Full);
        let state = RetryState { attempt: 1 };

        for _ in 0..10 {
            assert!(state.calculate_delay(&config) <= Duration::from_millis(100));
        }
    }

    #[test]
    fn test_should_retry_gives_up_after_max_attempts() {
        let config = RetryConfig::new();
        let mut state = RetryState::new();

        assert_eq!(
            should_retry(&mut state, &config),
            RetryDecision::Retry(Duration::from_millis(2000))
        );
        assert_eq!(
            should_retry(&mut state, &config),
            RetryDecision::Retry(Duration::from_millis(2000))
        );
        assert_eq!(should_retry(&mut state, &config), RetryDecision::GiveUp);
    }

    #[tokio::test]
    async fn test_with_retry_success_first_try() {
        let config = RetryConfig::new();
        let mut calls = 0;

        let result: Result<i32, RetryExhausted<&str>> = with_retry(
            &config,
            || {
                calls += 1;
                async { Ok(42) }
            },
            |_, _, _| {},
        )
        .await;

        assert_eq!(result, Ok(42));
        assert_eq!(calls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_retry_success_after_failures() {
        let config = RetryConfig::new();
        let mut calls = 0;
        let mut retries = Vec::new();

        let result: Result<i32, RetryExhausted<String>> = with_retry(
            &config,
            || {
                calls += 1;
                let n = calls;
                async move {
                    if n < 3 {
                        Err(format!("attempt {n}"))
                    } else {
                        Ok(42)
                    }
                }
            },
            |attempt, delay, err: &String| retries.push((attempt, delay, err.clone())),
        )
        .await;

        assert_eq!(result, Ok(42));
        assert_eq!(calls, 3);
        assert_eq!(
            retries,
            vec![
                (1, Duration::from_millis(2000), "attempt 1".to_string()),
                (2, Duration::from_millis(2000), "attempt 2".to_string()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_retry_all_failures() {
        let config = RetryConfig::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();

        let result: Result<i32, RetryExhausted<String>> = with_retry(
            &config,
            || {
                let c = calls_clone.clone();
                async move {
                    let n = c.fetch_add(1, Ordering::SeqCst) + 1;
                    Err(format!("failure {n}"))
                }
            },
            |_, _, _| {},
        )
        .await;

        assert_eq!(
            result,
            Err(RetryExhausted {
                attempts: 3,
                error: "failure 3".to_string()
            })
        );
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
