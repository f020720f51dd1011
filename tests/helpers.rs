//! Test utility functions for runnable
#![allow(dead_code)]

use runnable::callbacks::SpanOutcome;
use runnable::{Error, Lambda, Result, RunContext, Runnable, TraceCollector, TraceSpan};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Context with a trace collector attached
pub fn traced() -> (RunContext, Arc<TraceCollector>) {
    let collector = Arc::new(TraceCollector::new());
    let ctx = RunContext::new().with_listener(collector.clone());
    (ctx, collector)
}

pub fn upper() -> Lambda<String, String> {
    Lambda::new(|s: String| s.to_uppercase()).named("upper")
}

pub fn length() -> Lambda<String, usize> {
    Lambda::new(|s: String| s.len()).named("length")
}

pub fn times(factor: i32) -> Lambda<i32, i32> {
    Lambda::new(move |x: i32| x * factor).named(format!("times_{}", factor))
}

/// Component that fails on one specific input and counts its calls
pub struct FailOn {
    bad: i32,
    calls: AtomicUsize,
}

impl FailOn {
    pub fn new(bad: i32) -> Self {
        Self {
            bad,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Runnable for FailOn {
    type Input = i32;
    type Output = i32;

    fn invoke(&self, input: i32, ctx: &RunContext) -> Result<i32> {
        ctx.scope("FailOn", |_| {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if input == self.bad {
                Err(Error::invalid_input("FailOn", format!("refusing {}", input)))
            } else {
                Ok(input * 10)
            }
        })
    }
}

/// Sleeps before returning its input
pub fn sleepy(millis: u64) -> Lambda<i32, i32> {
    Lambda::new(move |x: i32| {
        std::thread::sleep(Duration::from_millis(millis));
        x
    })
    .named("sleepy")
}

/// Assert that `child` was started directly under `parent`
pub fn assert_child_of(child: &TraceSpan, parent: &TraceSpan) {
    assert_eq!(
        child.parent_run_id,
        Some(parent.run_id),
        "{} should be a child of {}",
        child.name,
        parent.name
    );
}

/// Assert that every span was closed exactly once
pub fn assert_all_closed(spans: &[TraceSpan]) {
    for span in spans {
        assert_ne!(
            span.outcome,
            SpanOutcome::Running,
            "span {} was never closed",
            span.name
        );
    }
}

/// Labels of a span's direct children, sorted
pub fn child_labels(collector: &TraceCollector, parent: &TraceSpan) -> Vec<String> {
    let mut labels: Vec<String> = collector
        .children_of(parent.run_id)
        .into_iter()
        .filter_map(|span| span.label)
        .collect();
    labels.sort();
    labels
}
