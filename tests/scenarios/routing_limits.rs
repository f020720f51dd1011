//! Test: dynamic dispatch, branches and the recursion budget

use crate::helpers::*;
use runnable::{BoxRunnable, Branch, Error, Lambda, Route, RunContext, Runnable, RunnableExt};
use std::sync::Arc;

/// Counts down to zero by handing `n - 1` to a fresh countdown
fn countdown() -> BoxRunnable<i32, i32> {
    Arc::new(
        Lambda::routing(|n: &i32, _: &RunContext| {
            Ok(if *n <= 0 {
                Route::Done(0)
            } else {
                Route::To(Lambda::new(|n: i32| n - 1).then(countdown()).boxed())
            })
        })
        .named("countdown"),
    )
}

fn forever() -> BoxRunnable<i32, i32> {
    Arc::new(Lambda::routing(|_: &i32, _: &RunContext| Ok(Route::To(forever()))).named("forever"))
}

#[test]
fn test_routing_hands_input_over() {
    let router = Lambda::routing(|x: &i32, _: &RunContext| {
        Ok(if *x < 0 {
            Route::to(Lambda::new(|x: i32| -x))
        } else {
            Route::Done(*x)
        })
    });
    let ctx = RunContext::new();
    assert_eq!(router.invoke(-4, &ctx).unwrap(), 4);
    assert_eq!(router.invoke(4, &ctx).unwrap(), 4);
}

#[test]
fn test_recursion_limit_stops_endless_dispatch() {
    let ctx = RunContext::new().with_recursion_limit(3);
    match forever().invoke(1, &ctx) {
        Err(Error::RecursionLimit { limit, .. }) => assert_eq!(limit, 3),
        Err(other) => panic!("unexpected error {}", other),
        Ok(value) => panic!("endless dispatch returned {}", value),
    }
}

#[test]
fn test_dispatch_within_budget_succeeds() {
    let ctx = RunContext::new().with_recursion_limit(25);
    assert_eq!(countdown().invoke(3, &ctx).unwrap(), 0);
}

#[test]
fn test_recursion_limit_through_sequences_reports_configured_budget() {
    let ctx = RunContext::new().with_recursion_limit(7);
    match countdown().invoke(100, &ctx) {
        Err(Error::RecursionLimit { component, limit }) => {
            assert_eq!(component, "countdown");
            assert_eq!(limit, 7);
        }
        Err(other) => panic!("unexpected error {}", other),
        Ok(value) => panic!("countdown finished with {}", value),
    }
}

#[tokio::test]
async fn test_async_recursion_limit_through_sequences() {
    let ctx = RunContext::new().with_recursion_limit(7);
    match countdown().ainvoke(100, ctx).await {
        Err(Error::RecursionLimit { limit, .. }) => assert_eq!(limit, 7),
        other => panic!("unexpected result {:?}", other.map_err(|e| e.to_string())),
    }
}

#[test]
fn test_dispatch_spans_nest() {
    let (ctx, collector) = traced();
    let ctx = ctx.with_recursion_limit(4);
    assert!(forever().invoke(1, &ctx).is_err());

    let spans = collector.spans();
    assert_all_closed(&spans);
    assert_eq!(spans.len(), 5);
    for pair in spans.windows(2) {
        assert_child_of(&pair[1], &pair[0]);
    }
    assert_eq!(spans[1].label.as_deref(), Some("dispatch:1"));
    assert_eq!(spans[4].label.as_deref(), Some("dispatch:4"));
}

#[tokio::test]
async fn test_async_recursion_limit_matches_sync() {
    let ctx = RunContext::new().with_recursion_limit(3);
    match forever().ainvoke(1, ctx).await {
        Err(Error::RecursionLimit { limit, .. }) => assert_eq!(limit, 3),
        other => panic!("unexpected result {:?}", other.map_err(|e| e.to_string())),
    }
}

#[test]
fn test_branch_picks_first_matching_condition() {
    let (ctx, collector) = traced();
    let branch = Branch::builder()
        .when(|x: &i32| *x > 100, times(0))
        .when(|x: &i32| *x > 10, times(2))
        .otherwise(times(3))
        .unwrap();

    assert_eq!(branch.invoke(50, &ctx).unwrap(), 100);
    assert_eq!(branch.invoke(5, &RunContext::new()).unwrap(), 15);

    let root = collector.find("Branch").unwrap();
    assert_eq!(child_labels(&collector, &root), vec!["branch:2"]);
}

#[test]
fn test_branch_without_conditions_is_rejected() {
    let result = Branch::<i32, i32>::builder().otherwise(times(1));
    assert!(matches!(result, Err(Error::InvalidComposition(_))));
}
