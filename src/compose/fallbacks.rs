//! Falling back to alternative components

use crate::core::{
    context::RunContext,
    error::{Error, Result},
    runnable::{BoxRunnable, ComponentKind, Runnable},
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

/// Tries the primary component, then each fallback in order, until one
/// succeeds. When all fail, the primary's error is returned.
pub struct Fallbacks<I, O> {
    candidates: Vec<BoxRunnable<I, O>>,
}

impl<I, O> Fallbacks<I, O>
where
    I: Clone + Send + 'static,
    O: Send + 'static,
{
    pub fn new(primary: BoxRunnable<I, O>, fallbacks: Vec<BoxRunnable<I, O>>) -> Self {
        let mut candidates = Vec::with_capacity(fallbacks.len() + 1);
        candidates.push(primary);
        candidates.extend(fallbacks);
        Self { candidates }
    }

    /// Add one more fallback at the end
    pub fn or<R>(mut self, fallback: R) -> Self
    where
        R: Runnable<Input = I, Output = O>,
    {
        self.candidates.push(Arc::new(fallback));
        self
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

fn candidate_label(index: usize) -> String {
    if index == 0 {
        "fallback:primary".to_string()
    } else {
        format!("fallback:{}", index)
    }
}

#[async_trait]
impl<I, O> Runnable for Fallbacks<I, O>
where
    I: Clone + Send + 'static,
    O: Send + 'static,
{
    type Input = I;
    type Output = O;

    fn invoke(&self, input: I, ctx: &RunContext) -> Result<O> {
        ctx.scope("Fallbacks", |ctx| {
            let mut first_error: Option<Error> = None;
            for (index, candidate) in self.candidates.iter().enumerate() {
                let result = ctx.child_scope(candidate_label(index), &candidate.name(), |ctx| {
                    candidate.invoke(input.clone(), ctx)
                });
                match result {
                    Ok(output) => return Ok(output),
                    Err(e) => {
                        warn!("{} failed, trying next candidate: {}", candidate.name(), e);
                        first_error.get_or_insert(e);
                    }
                }
            }
            Err(first_error
                .unwrap_or_else(|| Error::InvalidComposition("no candidates".to_string())))
        })
    }

    fn name(&self) -> String {
        "Fallbacks".to_string()
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Fallbacks
    }

    async fn ainvoke(self: Arc<Self>, input: I, ctx: RunContext) -> Result<O> {
        let this = self.clone();
        ctx.scope_async("Fallbacks", move |ctx| async move {
            let mut first_error: Option<Error> = None;
            for (index, candidate) in this.candidates.iter().enumerate() {
                let name = candidate.name();
                let candidate = candidate.clone();
                let attempt_input = input.clone();
                let result = ctx
                    .child_scope_async(candidate_label(index), &name, move |ctx| {
                        candidate.ainvoke(attempt_input, ctx)
                    })
                    .await;
                match result {
                    Ok(output) => return Ok(output),
                    Err(e) => {
                        warn!("{} failed, trying next candidate: {}", name, e);
                        first_error.get_or_insert(e);
                    }
                }
            }
            Err(first_error
                .unwrap_or_else(|| Error::InvalidComposition("no candidates".to_string())))
        })
        .await
    }
}
