//! Configuration for retry and memoization behavior.
//!
//! Every field has a default matching the fixed behavior (three attempts,
//! two seconds apart, lazy memoization), so an empty JSON object is a
//! complete configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::KvflowError;
use crate::memo::{ComputeMode, MemoConfig};
use crate::waterfall::RetryConfig;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KvflowConfig {
    /// Retry policy for waterfall steps.
    #[serde(default)]
    pub retry: RetryConfig,
    /// Memoizer settings.
    #[serde(default)]
    pub memo: MemoConfig,
}

impl KvflowConfig {
    /// Creates a configuration with all defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from JSON.
    pub fn from_json_str(json: &str) -> Result<Self, KvflowError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, KvflowError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| KvflowError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&contents)
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the memoization mode.
    #[must_use]
    pub const fn with_memo_mode(mut self, mode: ComputeMode) -> Self {
        self.memo.mode = mode;
        self
    }

    /// Checks values that deserialize fine but cannot be honored.
    pub fn validate(&self) -> Result<(), KvflowError> {
        if self.retry.max_attempts == 0 {
            return Err(KvflowError::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.retry.max_delay_ms < self.retry.base_delay_ms {
            return Err(KvflowError::Config(format!(
                "retry.max_delay_ms ({}) is below retry.base_delay_ms ({})",
                self.retry.max_delay_ms, self.retry.base_delay_ms
            )));
        }
        Ok(())
    }
}
