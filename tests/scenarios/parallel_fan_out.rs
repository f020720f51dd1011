//! Test: fan-out to named branches

use crate::helpers::*;
use runnable::{Error, Lambda, Parallel, RunContext, Runnable, RunnableExt};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[test]
fn test_parallel_outputs_by_name() {
    let fan_out = Parallel::builder()
        .branch("a", times(2))
        .branch("b", Lambda::new(|x: i32| x * x))
        .build()
        .unwrap();
    let outputs = fan_out.invoke(3, &RunContext::new()).unwrap();
    assert_eq!(outputs.len(), 2);
    assert_eq!(outputs["a"], 6);
    assert_eq!(outputs["b"], 9);
}

#[test]
fn test_empty_parallel_is_rejected() {
    let result = Parallel::<i32, i32>::builder().build();
    assert!(matches!(result, Err(Error::InvalidComposition(_))));
}

#[test]
fn test_duplicate_branch_is_rejected() {
    let result = Parallel::builder()
        .branch("a", times(2))
        .branch("a", times(3))
        .build();
    assert!(matches!(result, Err(Error::InvalidComposition(_))));
}

#[test]
fn test_branches_run_concurrently() {
    let fan_out = Parallel::builder()
        .branch("one", sleepy(150))
        .branch("two", sleepy(150))
        .branch("three", sleepy(150))
        .build()
        .unwrap();

    let start = Instant::now();
    fan_out
        .invoke(1, &RunContext::new().with_max_concurrency(3))
        .unwrap();
    assert!(start.elapsed() < Duration::from_millis(400));
}

#[test]
fn test_failing_branch_fails_the_whole() {
    let fan_out = Parallel::builder()
        .branch("ok", times(2))
        .branch("bad", FailOn::new(3))
        .build()
        .unwrap();
    assert!(fan_out.invoke(3, &RunContext::new()).is_err());
    assert_eq!(fan_out.invoke(4, &RunContext::new()).unwrap()["bad"], 40);
}

#[test]
fn test_parallel_feeds_next_stage() {
    let fan_out = Parallel::builder()
        .branch("a", times(2))
        .branch("b", times(3))
        .build()
        .unwrap();
    let total = fan_out.then_fn(|outputs| outputs.values().sum::<i32>());
    assert_eq!(total.invoke(2, &RunContext::new()).unwrap(), 10);
}

#[tokio::test]
async fn test_async_parallel_matches_sync() {
    let fan_out = Arc::new(
        Parallel::builder()
            .branch("a", times(2))
            .branch("b", times(5))
            .build()
            .unwrap(),
    );
    let sync = fan_out.invoke(7, &RunContext::new()).unwrap();
    let outputs = fan_out.clone().ainvoke(7, RunContext::new()).await.unwrap();
    assert_eq!(sync, outputs);
}

#[test]
fn test_branch_spans_are_labeled_by_key() {
    let (ctx, collector) = traced();
    let fan_out = Parallel::builder()
        .branch("left", times(2))
        .branch("right", times(3))
        .build()
        .unwrap();
    fan_out.invoke(1, &ctx).unwrap();

    let root = collector.find("Parallel").unwrap();
    assert_eq!(
        child_labels(&collector, &root),
        vec!["map:key:left", "map:key:right"]
    );
}
