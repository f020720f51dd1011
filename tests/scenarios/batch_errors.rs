//! Test: batch error policies

use crate::helpers::*;
use runnable::{Error, Lambda, Parallel, RunContext, Runnable, RunnableExt};
use std::sync::Arc;

#[test]
fn test_batch_preserves_order() {
    let outputs = times(3)
        .batch((1..=20).collect(), &RunContext::new())
        .unwrap();
    assert_eq!(outputs, (1..=20).map(|x| x * 3).collect::<Vec<_>>());
}

#[test]
fn test_large_batch_without_concurrency_limit() {
    let outputs = Lambda::new(|x: i32| x)
        .batch((0..10_000).collect(), &RunContext::new())
        .unwrap();
    assert_eq!(outputs.len(), 10_000);
    assert_eq!(outputs[9_999], 9_999);
}

#[test]
fn test_large_batch_over_parallel_branches() {
    let fan_out = Parallel::builder()
        .branch("double", times(2))
        .branch("same", Lambda::new(|x: i32| x))
        .build()
        .unwrap();
    let outputs = fan_out
        .batch((0..10_000).collect(), &RunContext::new())
        .unwrap();
    assert_eq!(outputs.len(), 10_000);
    assert_eq!(outputs[4_321]["double"], 8_642);
    assert_eq!(outputs[4_321]["same"], 4_321);
}

#[test]
fn test_batch_fails_on_first_error() {
    let result = FailOn::new(2).batch(vec![1, 2, 3], &RunContext::new());
    assert!(matches!(result, Err(Error::InvalidInput { .. })));
}

#[test]
fn test_continue_on_error_keeps_positions() {
    let results = FailOn::new(2).batch_continue_on_error(vec![1, 2, 3], &RunContext::new());
    assert_eq!(results.len(), 3);
    assert_eq!(*results[0].as_ref().unwrap(), 10);
    assert!(results[1].is_err());
    assert_eq!(*results[2].as_ref().unwrap(), 30);
}

#[test]
fn test_empty_batch() {
    assert!(times(2).batch(Vec::new(), &RunContext::new()).unwrap().is_empty());
}

#[test]
fn test_batch_respects_max_concurrency_of_one() {
    let ctx = RunContext::new().with_max_concurrency(1);
    let outputs = sleepy(5).then(times(2)).batch(vec![1, 2, 3], &ctx).unwrap();
    assert_eq!(outputs, vec![2, 4, 6]);
}

#[test]
fn test_traced_sequence_batch_gives_each_input_a_tree() {
    let (ctx, collector) = traced();
    times(2).then(times(3)).batch(vec![1, 2], &ctx).unwrap();

    let roots = collector.roots();
    assert_eq!(roots.len(), 2);
    for root in &roots {
        assert_eq!(collector.children_of(root.run_id).len(), 2);
    }
}

#[tokio::test]
async fn test_abatch_continue_on_error() {
    let failing = Arc::new(FailOn::new(5));
    let results = failing
        .clone()
        .abatch_continue_on_error(vec![4, 5, 6], RunContext::new())
        .await;
    assert!(results[0].is_ok());
    assert!(results[1].is_err());
    assert!(results[2].is_ok());
    assert_eq!(failing.calls(), 3);
}
