//! Memoization across modes, and lazy sequence adapters.

use kvflow::errors::MemoError;
use kvflow::lazy::{lazy_filter, lazy_map};
use kvflow::memo::{memoize, memoize_async, memoize_eager, memoize_with, ComputeMode, MemoConfig};
use kvflow::testing::CallCounter;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tokio_test::assert_ok;

#[tokio::test]
async fn lazy_memo_runs_once_per_distinct_input() {
    let counter = CallCounter::new();
    let square = memoize(counter.wrap(|x: &u64| x * x));

    assert_eq!(assert_ok!(square.call(4).await), 16);
    assert_eq!(assert_ok!(square.call(4).await), 16);
    assert_eq!(assert_ok!(square.call(5).await), 25);

    assert_eq!(counter.count(), 2);
    assert_eq!(square.store().len(), 2);
}

#[tokio::test]
async fn eager_memo_runs_every_call_with_stable_result() {
    let counter = CallCounter::new();
    let ticks = counter.clone();
    let stamp = memoize_eager(move |_: &&str| ticks.hit());

    assert_eq!(stamp.call("a").await, Ok(1));
    assert_eq!(stamp.call("a").await, Ok(1));
    assert_eq!(stamp.call("a").await, Ok(1));
    assert_eq!(counter.count(), 3);
}

#[tokio::test]
async fn memoizers_do_not_share_caches() {
    let first = memoize(|x: &u8| u32::from(*x));
    let second = memoize(|x: &u8| u32::from(*x) + 100);

    assert_eq!(first.call(1).await, Ok(1));
    assert_eq!(second.call(1).await, Ok(101));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn single_flight_memo_runs_once_under_contention() {
    let counter = CallCounter::new();
    let config = MemoConfig::new().with_mode(ComputeMode::SingleFlight);
    let memo = Arc::new(memoize_with(counter.wrap(|x: &u32| x + 1), &config));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let memo = Arc::clone(&memo);
            tokio::spawn(async move { memo.call(10).await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap(), Ok(11));
    }
    assert_eq!(counter.count(), 1);
}

#[tokio::test]
async fn async_memo_retries_after_failure() {
    let counter = CallCounter::new();
    let calls = counter.clone();
    let lookup = memoize_async(move |name: String| {
        let n = calls.hit();
        async move {
            if n == 1 {
                Err(format!("{name} unavailable"))
            } else {
                Ok(name.len())
            }
        }
    });

    let first = lookup.call("kvflow".to_string()).await;
    assert!(matches!(first, Err(MemoError::Compute(ref e)) if e == "kvflow unavailable"));

    assert_eq!(assert_ok!(lookup.call("kvflow".to_string()).await), 6);
    assert_eq!(assert_ok!(lookup.call("kvflow".to_string()).await), 6);
    assert_eq!(counter.count(), 2);
}

#[test]
fn lazy_filter_and_map() {
    let evens = lazy_filter(|| vec![1, 2, 3, 4], |x: &i32| x % 2 == 0);
    assert_eq!(evens.iter().collect::<Vec<_>>(), vec![2, 4]);

    let doubled = lazy_map(|| vec![1, 2, 3], |x: i32| x * 2);
    assert_eq!(doubled.iter().collect::<Vec<_>>(), vec![2, 4, 6]);
}

#[test]
fn lazy_map_over_infinite_source() {
    let odds = lazy_filter(|| 0_u64.., |x: &u64| x % 2 == 1);
    let cubes = lazy_map(|| odds.iter(), |x: u64| x.pow(3));

    assert_eq!(cubes.iter().take(3).collect::<Vec<_>>(), vec![1, 27, 125]);
    assert_eq!(cubes.iter().nth(3), Some(343));
}
