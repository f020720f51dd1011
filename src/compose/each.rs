//! Mapping a component over a list

use crate::core::{
    context::RunContext,
    error::Result,
    runnable::{ComponentKind, Runnable},
};
use crate::execution::pool::WorkerPool;
use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;

/// Applies the inner component to every element of the input list.
/// Output order matches input order; the first failing element fails the call.
pub struct Each<R> {
    inner: Arc<R>,
}

impl<R: Runnable> Each<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }
}

fn item_label(index: usize) -> String {
    format!("map:item:{}", index + 1)
}

#[async_trait]
impl<R: Runnable> Runnable for Each<R> {
    type Input = Vec<R::Input>;
    type Output = Vec<R::Output>;

    fn invoke(&self, inputs: Vec<R::Input>, ctx: &RunContext) -> Result<Vec<R::Output>> {
        let name = self.name();
        ctx.scope(&name, |ctx| {
            if inputs.is_empty() {
                return Ok(Vec::new());
            }
            let inner_name = self.inner.name();
            let pool = WorkerPool::for_context(ctx, inputs.len())?;
            pool.try_map(
                inputs.into_iter().enumerate().collect(),
                |(index, input)| {
                    ctx.child_scope(item_label(index), &inner_name, |ctx| {
                        self.inner.invoke(input, ctx)
                    })
                },
            )
        })
    }

    fn name(&self) -> String {
        format!("Each<{}>", self.inner.name())
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Each
    }

    async fn ainvoke(self: Arc<Self>, inputs: Vec<R::Input>, ctx: RunContext) -> Result<Vec<R::Output>> {
        let name = self.name();
        let inner = self.inner.clone();
        ctx.scope_async(&name, move |ctx| async move {
            let limit = ctx.max_concurrency().unwrap_or(inputs.len()).max(1);
            let inner_name = inner.name();
            stream::iter(inputs.into_iter().enumerate().map(|(index, input)| {
                let inner = inner.clone();
                let ctx = ctx.clone();
                let inner_name = inner_name.clone();
                async move {
                    ctx.child_scope_async(item_label(index), &inner_name, move |ctx| {
                        inner.ainvoke(input, ctx)
                    })
                    .await
                }
            }))
            .buffered(limit)
            .try_collect()
            .await
        })
        .await
    }
}
