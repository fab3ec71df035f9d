//! End-to-end waterfall runs against the paused tokio clock.

use kvflow::config::KvflowConfig;
use kvflow::events::{self, CollectingEventSink};
use kvflow::testing::{assert_state, assert_step_failed, CallCounter, FlakyStep};
use kvflow::waterfall::{
    boxed_step, run_waterfall, run_waterfall_with, RetryConfig, Waterfall, WaterfallState,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tokio::time::{Duration, Instant};
use tokio_test::assert_ok;

#[tokio::test(start_paused = true)]
async fn all_steps_succeed_first_try_without_waiting() {
    let waterfall = Waterfall::new(|| async { Ok::<_, String>(2) })
        .then(|x: i32| async move { Ok(x + 3) })
        .then(|x: i32| async move { Ok(x * 4) });

    let started = Instant::now();
    assert_eq!(assert_ok!(waterfall.run().await), 20);
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn step_recovers_on_third_attempt() {
    let flaky = FlakyStep::new(2, 0);
    let waterfall =
        Waterfall::new(|| async { Ok::<_, anyhow::Error>(5) }).then(flaky.step_with_input());

    let started = Instant::now();
    let (result, state) = waterfall.run_with_state().await;

    assert_eq!(result.unwrap(), 5);
    assert_state(&state, &WaterfallState::Succeeded);
    assert_eq!(flaky.calls(), 3);
    assert!(started.elapsed() >= Duration::from_millis(4000));
    assert!(started.elapsed() < Duration::from_millis(4100));
}

#[tokio::test(start_paused = true)]
async fn exhausted_step_halts_the_run() {
    let first = FlakyStep::new(0, 1);
    let failing = FlakyStep::new(usize::MAX, 0);
    let never = CallCounter::new();
    let never_calls = never.clone();

    let waterfall = Waterfall::new(first.step())
        .then(failing.step_with_input())
        .then(move |x: i32| {
            never_calls.hit();
            async move { Ok(x) }
        });

    let started = Instant::now();
    let (result, state) = waterfall.run_with_state().await;

    assert_step_failed(&result, 1, 3);
    assert_state(&state, &WaterfallState::Failed { step: 1, attempts: 3 });
    assert_eq!(first.calls(), 1);
    assert_eq!(failing.calls(), 3);
    assert_eq!(never.count(), 0);
    // Two waits between three attempts; no wait after the last one.
    assert!(started.elapsed() >= Duration::from_millis(4000));
    assert!(started.elapsed() < Duration::from_millis(4100));
}

#[tokio::test(start_paused = true)]
async fn failed_run_emits_failure_event_last() {
    let sink = Arc::new(CollectingEventSink::new());
    let failing = FlakyStep::new(usize::MAX, 0);
    let waterfall = Waterfall::new(failing.step()).with_event_sink(sink.clone());

    assert!(waterfall.run().await.is_err());

    let types = sink.event_types();
    assert_eq!(types.first().map(String::as_str), Some(events::WATERFALL_STARTED));
    assert_eq!(types.last().map(String::as_str), Some(events::WATERFALL_FAILED));
    assert_eq!(sink.events_of_type(events::STEP_RETRYING).len(), 2);
    assert!(sink.events_of_type(events::WATERFALL_SUCCEEDED).is_empty());

    let failed = sink.events_of_type(events::WATERFALL_FAILED);
    let payload = failed[0].as_ref().unwrap();
    assert_eq!(payload["step"], 0);
    assert_eq!(payload["attempts"], 3);
    assert_eq!(payload["error"], "flaky failure #3");
}

#[tokio::test(start_paused = true)]
async fn homogeneous_chain_with_configured_policy() {
    let config =
        KvflowConfig::from_json_str(r#"{"retry": {"max_attempts": 2, "base_delay_ms": 50}}"#)
            .unwrap();
    let flaky = FlakyStep::new(1, 0);

    let started = Instant::now();
    let result = run_waterfall_with(
        config.retry,
        || async { Ok::<_, anyhow::Error>(1) },
        vec![
            boxed_step(flaky.step_with_input()),
            boxed_step(|x: i32| async move { Ok(x + 1) }),
        ],
    )
    .await;

    assert_eq!(result.unwrap(), 2);
    assert!(started.elapsed() >= Duration::from_millis(50));
    assert!(started.elapsed() < Duration::from_millis(150));
}

#[tokio::test(start_paused = true)]
async fn single_attempt_policy_fails_immediately() {
    let failing = FlakyStep::new(1, 0);
    let waterfall =
        Waterfall::new(failing.step()).with_config(RetryConfig::new().with_max_attempts(1));

    let started = Instant::now();
    let result = waterfall.run().await;

    assert_step_failed(&result, 0, 1);
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test]
async fn default_homogeneous_chain() {
    let result = run_waterfall(
        || async { Ok::<_, String>(String::from("a")) },
        vec![
            boxed_step(|s: String| async move { Ok(s + "b") }),
            boxed_step(|s: String| async move { Ok(s + "c") }),
        ],
    )
    .await;

    assert_eq!(result.unwrap(), "abc");
}
