//! Test assertions for store and waterfall results.

use std::fmt::Debug;

use crate::errors::{StoreError, WaterfallError};
use crate::waterfall::WaterfallState;

/// Asserts that a store operation failed because the key was absent.
pub fn assert_missing_key<T: Debug>(result: &Result<T, StoreError>) {
    assert!(
        matches!(result, Err(StoreError::MissingKey)),
        "Expected MissingKey, got {:?}",
        result
    );
}

/// Asserts that a store operation failed in the backend with `message`.
pub fn assert_backend_error<T: Debug>(result: &Result<T, StoreError>, message: &str) {
    match result {
        Err(StoreError::Backend(actual)) => assert_eq!(
            actual, message,
            "Expected backend error '{}', got '{}'",
            message, actual
        ),
        other => panic!("Expected backend error '{message}', got {other:?}"),
    }
}

/// Asserts that a waterfall stopped at `step` after `attempts` attempts.
pub fn assert_step_failed<T: Debug, E: Debug>(
    result: &Result<T, WaterfallError<E>>,
    step: usize,
    attempts: usize,
) {
    match result {
        Err(err) => {
            assert_eq!(err.step(), step, "Expected failure at step {}, got {:?}", step, err);
            assert_eq!(
                err.attempts(),
                attempts,
                "Expected {} attempt(s), got {:?}",
                attempts,
                err
            );
        }
        Ok(value) => panic!("Expected step {step} to fail, got Ok({value:?})"),
    }
}

/// Asserts that a waterfall finished in the expected state.
pub fn assert_state(actual: &WaterfallState, expected: &WaterfallState) {
    assert_eq!(
        actual, expected,
        "Expected state {}, got {}",
        expected, actual
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assert_missing_key_passes() {
        assert_missing_key::<()>(&Err(StoreError::MissingKey));
    }

    #[test]
    #[should_panic(expected = "Expected MissingKey")]
    fn test_assert_missing_key_rejects_ok() {
        assert_missing_key(&Ok::<_, StoreError>(1));
    }

    #[test]
    fn test_assert_step_failed_passes() {
        let result: Result<i32, _> = Err(WaterfallError::StepFailed {
            step: 1,
            attempts: 3,
            error: "boom",
        });
        assert_step_failed(&result, 1, 3);
    }

    #[test]
    #[should_panic(expected = "Expected failure at step 0")]
    fn test_assert_step_failed_wrong_step() {
        let result: Result<i32, _> = Err(WaterfallError::StepFailed {
            step: 2,
            attempts: 3,
            error: "boom",
        });
        assert_step_failed(&result, 0, 3);
    }
}
