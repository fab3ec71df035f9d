//! Waterfall execution state machine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Execution state of one waterfall invocation.
///
/// A run starts in `Pending { step: 0 }`. A successful step moves to the
/// next `Pending` state, or to `Succeeded` after the last step. A failed
/// attempt moves to `Retrying` while attempts remain, and to `Failed`
/// once the step has used all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WaterfallState {
    /// About to run `step` for the first time.
    Pending {
        /// Zero-based step index.
        step: usize,
    },
    /// About to re-run `step` after `attempt` failed attempts.
    Retrying {
        /// Zero-based step index.
        step: usize,
        /// Failed attempts so far for this step.
        attempt: usize,
    },
    /// Every step succeeded.
    Succeeded,
    /// `step` failed on all `attempts`; later steps never ran.
    Failed {
        /// Zero-based step index.
        step: usize,
        /// Attempts made for this step.
        attempts: usize,
    },
}

impl WaterfallState {
    /// The initial state of every run.
    #[must_use]
    pub const fn initial() -> Self {
        Self::Pending { step: 0 }
    }

    /// Step the run is positioned at, if it has not finished.
    #[must_use]
    pub const fn step(&self) -> Option<usize> {
        match self {
            Self::Pending { step } | Self::Retrying { step, .. } => Some(*step),
            Self::Succeeded | Self::Failed { .. } => None,
        }
    }

    /// Failed attempts recorded for the current step.
    #[must_use]
    pub const fn failed_attempts(&self) -> usize {
        match self {
            Self::Retrying { attempt, .. } => *attempt,
            Self::Failed { attempts, .. } => *attempts,
            Self::Pending { .. } | Self::Succeeded => 0,
        }
    }

    /// Returns true once the run has succeeded or failed.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed { .. })
    }

    /// Transition after the current step produced a value.
    #[must_use]
    pub const fn on_success(self, total_steps: usize) -> Self {
        match self {
            Self::Pending { step } | Self::Retrying { step, .. } => {
                if step + 1 >= total_steps {
                    Self::Succeeded
                } else {
                    Self::Pending { step: step + 1 }
                }
            }
            terminal => terminal,
        }
    }

    /// Transition after an attempt of the current step failed.
    #[must_use]
    pub const fn on_failure(self, max_attempts: usize) -> Self {
        match self {
            Self::Pending { step } | Self::Retrying { step, .. } => {
                let attempt = self.failed_attempts() + 1;
                if attempt < max_attempts {
                    Self::Retrying { step, attempt }
                } else {
                    Self::Failed {
                        step,
                        attempts: attempt,
                    }
                }
            }
            terminal => terminal,
        }
    }
}

impl Default for WaterfallState {
    fn default() -> Self {
        Self::initial()
    }
}

impl fmt::Display for WaterfallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending { step } => write!(f, "pending({step})"),
            Self::Retrying { step, attempt } => write!(f, "retrying({step}, {attempt})"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed { step, attempts } => write!(f, "failed({step}, {attempts})"),
        }
    }
}
