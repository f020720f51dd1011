//! Identity component

use crate::core::{
    context::RunContext,
    error::Result,
    runnable::{ComponentKind, Runnable},
};
use async_trait::async_trait;
use std::marker::PhantomData;
use std::sync::Arc;

/// Returns its input unchanged
///
/// Useful as a parallel branch that forwards the original input next to
/// computed values.
pub struct Passthrough<T> {
    _type: PhantomData<fn(T) -> T>,
}

impl<T> Passthrough<T> {
    pub fn new() -> Self {
        Self { _type: PhantomData }
    }
}

impl<T> Default for Passthrough<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T> Runnable for Passthrough<T>
where
    T: Send + 'static,
{
    type Input = T;
    type Output = T;

    fn invoke(&self, input: T, ctx: &RunContext) -> Result<T> {
        ctx.scope("Passthrough", |_| Ok(input))
    }

    fn name(&self) -> String {
        "Passthrough".to_string()
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Passthrough
    }

    async fn ainvoke(self: Arc<Self>, input: T, ctx: RunContext) -> Result<T> {
        ctx.scope_async("Passthrough", |_| async move { Ok(input) }).await
    }
}
