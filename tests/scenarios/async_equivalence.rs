//! Test: async entry points agree with the blocking ones

use crate::helpers::*;
use futures::TryStreamExt;
use runnable::{Error, Lambda, Parallel, Result, RunContext, Runnable, RunnableExt};
use std::sync::Arc;

#[tokio::test]
async fn test_ainvoke_matches_invoke() {
    let chain = Arc::new(upper().then(length()));
    let ctx = RunContext::new();
    let sync = chain.invoke("hello".to_string(), &ctx).unwrap();
    let async_result = chain.clone().ainvoke("hello".to_string(), ctx).await.unwrap();
    assert_eq!(sync, async_result);
}

#[tokio::test]
async fn test_abatch_matches_batch() {
    let chain = Arc::new(times(2).then(times(3)));
    let inputs: Vec<i32> = (1..=8).collect();
    let sync = chain.batch(inputs.clone(), &RunContext::new()).unwrap();
    let async_result = chain.clone().abatch(inputs, RunContext::new()).await.unwrap();
    assert_eq!(sync, async_result);
}

#[tokio::test]
async fn test_async_error_matches_sync_error() {
    let chain = Arc::new(times(1).then(FailOn::new(3)));
    let sync = chain.invoke(3, &RunContext::new()).unwrap_err();
    let async_err = chain.clone().ainvoke(3, RunContext::new()).await.unwrap_err();
    assert_eq!(sync.to_string(), async_err.to_string());
}

#[tokio::test]
async fn test_native_async_lambda_in_chain() {
    let fetch = Lambda::new_async(|x: i32| async move {
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        Ok(x + 1)
    });
    let chain = Arc::new(times(2).then(fetch));
    assert_eq!(chain.ainvoke(4, RunContext::new()).await.unwrap(), 9);
}

#[test]
fn test_async_only_lambda_rejects_invoke() {
    let fetch = Lambda::new_async(|x: i32| async move { Ok(x) }).named("fetch");
    let err = fetch.invoke(1, &RunContext::new()).unwrap_err();
    assert!(matches!(err, Error::AsyncOnly(name) if name == "fetch"));
}

#[test]
fn test_lambda_with_async_twin_keeps_sync_path() {
    let both = Lambda::new(|x: i32| x * 2).with_async(|x: i32| async move { Ok(x * 2) });
    assert!(both.is_async());
    assert_eq!(both.invoke(3, &RunContext::new()).unwrap(), 6);
}

#[tokio::test]
async fn test_astream_yields_single_output_by_default() {
    let fan_out = Arc::new(
        Parallel::builder()
            .branch("a", times(2))
            .build()
            .unwrap(),
    );
    let outputs: Vec<_> = fan_out
        .astream(5, RunContext::new())
        .try_collect()
        .await
        .unwrap();
    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs[0]["a"], 10);
}

#[tokio::test]
async fn test_async_parallel_respects_concurrency_limit() {
    let fan_out = Arc::new(
        Parallel::builder()
            .branch("one", sleepy(10))
            .branch("two", sleepy(10))
            .branch("three", sleepy(10))
            .build()
            .unwrap(),
    );
    let ctx = RunContext::new().with_max_concurrency(1);
    let outputs: Result<_> = fan_out.ainvoke(1, ctx).await;
    assert_eq!(outputs.unwrap().len(), 3);
}
