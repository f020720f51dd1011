//! Test: span trees mirror the composition shape

use crate::helpers::*;
use runnable::{Lambda, Parallel, RunContext, RunEvent, Runnable, RunnableExt};
use std::sync::Arc;

#[test]
fn test_sequence_span_tree() {
    let (ctx, collector) = traced();
    upper().then(length()).invoke("abc".to_string(), &ctx).unwrap();

    let spans = collector.spans();
    assert_eq!(spans.len(), 3);
    assert_all_closed(&spans);

    let root = &spans[0];
    assert_eq!(root.name, "Sequence");
    assert!(root.parent_run_id.is_none());
    assert!(root.label.is_none());

    let upper_span = collector.find("upper").unwrap();
    let length_span = collector.find("length").unwrap();
    assert_child_of(&upper_span, root);
    assert_child_of(&length_span, root);
    assert_eq!(upper_span.label.as_deref(), Some("seq:step:1"));
    assert_eq!(length_span.label.as_deref(), Some("seq:step:2"));
    assert!(upper_span.started_at <= length_span.started_at);
}

#[test]
fn test_error_closes_every_open_span() {
    let (ctx, collector) = traced();
    let chain = times(1).then(FailOn::new(1)).then(times(2));
    assert!(chain.invoke(1, &ctx).is_err());

    let spans = collector.spans();
    assert_all_closed(&spans);
    assert_eq!(spans.len(), 3);
    assert!(collector.find("Sequence").unwrap().is_error());
    assert!(collector.find("FailOn").unwrap().is_error());
    assert!(collector.find("times_2").is_none());
}

#[test]
fn test_parallel_inside_sequence() {
    let (ctx, collector) = traced();
    let fan_out = Parallel::builder()
        .branch("a", times(2))
        .branch("b", times(3))
        .build()
        .unwrap();
    let chain = times(1).then(fan_out).then_fn(|outputs| outputs.len());
    assert_eq!(chain.invoke(1, &ctx).unwrap(), 2);

    let parallel = collector.find("Parallel").unwrap();
    assert_eq!(parallel.label.as_deref(), Some("seq:step:2"));
    assert_child_of(&parallel, &collector.find("Sequence").unwrap());
    for branch in collector.children_of(parallel.run_id) {
        assert!(branch.label.unwrap().starts_with("map:key:"));
    }
    assert_eq!(collector.spans().len(), 6);
}

#[test]
fn test_tags_and_metadata_reach_events() {
    let collector = Arc::new(runnable::TraceCollector::new());
    let ctx = RunContext::new()
        .with_listener(collector.clone())
        .with_tag("demo")
        .with_metadata("user", "alice");
    times(2).invoke(1, &ctx).unwrap();

    let start = collector
        .events()
        .into_iter()
        .find_map(|event| match event {
            RunEvent::Start(info) => Some(info),
            _ => None,
        })
        .unwrap();
    assert_eq!(start.tags, vec!["demo".to_string()]);
    assert_eq!(start.metadata["user"], "alice");
}

#[test]
fn test_run_name_renames_root_span() {
    let (ctx, collector) = traced();
    let ctx = ctx.with_run_name("my-run");
    Lambda::new(|x: i32| x).invoke(1, &ctx).unwrap();
    assert_eq!(collector.roots()[0].name, "my-run");
}

#[test]
fn test_each_event_pair_shares_run_id() {
    let (ctx, collector) = traced();
    upper().then(length()).invoke("x".to_string(), &ctx).unwrap();

    let events = collector.events();
    assert_eq!(events.len(), 6);
    for event in events.iter().filter(|event| event.is_terminal()) {
        assert!(events
            .iter()
            .any(|start| matches!(start, RunEvent::Start(info) if info.run_id == event.run_id())));
    }
}

#[tokio::test]
async fn test_async_tree_matches_sync_tree() {
    let (sync_ctx, sync_collector) = traced();
    let (async_ctx, async_collector) = traced();
    let chain = Arc::new(upper().then(length()));

    chain.invoke("abc".to_string(), &sync_ctx).unwrap();
    chain.clone().ainvoke("abc".to_string(), async_ctx).await.unwrap();

    let shape = |spans: Vec<runnable::TraceSpan>| -> Vec<(String, Option<String>)> {
        spans.into_iter().map(|span| (span.name, span.label)).collect()
    };
    assert_eq!(shape(sync_collector.spans()), shape(async_collector.spans()));
}
