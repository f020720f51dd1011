//! Test: nested chains are spliced into one flat sequence

use crate::helpers::*;
use runnable::{ComponentKind, RunContext, Runnable, RunnableExt};

#[test]
fn test_chaining_two_sequences_splices_both() {
    let left = times(2).then(times(3));
    let right = times(5).then(times(7));
    let chain = left.then(right);

    assert_eq!(chain.len(), 4);
    assert_eq!(
        chain.stage_names(),
        vec!["times_2", "times_3", "times_5", "times_7"]
    );
    assert!(chain
        .steps()
        .iter()
        .all(|stage| stage.kind() != ComponentKind::Sequence));
    assert_eq!(chain.invoke(1, &RunContext::new()).unwrap(), 210);
}

#[test]
fn test_sequence_on_the_right_is_spliced() {
    let chain = times(2).then(times(3).then(times(4)));
    assert_eq!(chain.len(), 3);
    assert_eq!(chain.first().name(), "times_2");
    assert_eq!(chain.middle().len(), 1);
    assert_eq!(chain.last().name(), "times_4");
}

#[test]
fn test_boxed_sequence_is_spliced() {
    let inner = times(2).then(times(3)).boxed();
    let chain = inner.then(times(10));
    assert_eq!(chain.len(), 3);
    assert_eq!(chain.invoke(1, &RunContext::new()).unwrap(), 60);
}

#[test]
fn test_flattened_trace_has_one_level_of_steps() {
    let (ctx, collector) = traced();
    let chain = times(2).then(times(3)).then(times(4).then(times(5)));
    chain.invoke(1, &ctx).unwrap();

    let roots = collector.roots();
    assert_eq!(roots.len(), 1);
    assert_eq!(
        child_labels(&collector, &roots[0]),
        vec!["seq:step:1", "seq:step:2", "seq:step:3", "seq:step:4"]
    );
    assert_eq!(collector.spans().len(), 5);
}
