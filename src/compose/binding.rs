//! Components with bound configuration

use crate::core::{
    config::RunConfig,
    context::RunContext,
    error::Result,
    runnable::{ComponentKind, RunStream, Runnable, TypeInfo},
};
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::sync::Arc;

/// Wraps a component and merges a fixed [`RunConfig`] into every context it
/// is called with. Bound tags and metadata are added to the caller's;
/// bound limits replace the caller's.
pub struct Bound<R> {
    inner: Arc<R>,
    config: RunConfig,
    name: Option<String>,
}

impl<R: Runnable> Bound<R> {
    pub fn new(inner: R, config: RunConfig) -> Self {
        Self {
            inner: Arc::new(inner),
            config,
            name: None,
        }
    }

    /// Rename the component. The name is also used for the root span.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.config.run_name = Some(name.clone());
        self.name = Some(name);
        self
    }

    /// Bind more configuration on top of the existing one
    pub fn with_config(mut self, config: RunConfig) -> Self {
        self.config.tags.extend(config.tags);
        self.config.metadata.extend(config.metadata);
        if config.max_concurrency.is_some() {
            self.config.max_concurrency = config.max_concurrency;
        }
        if config.recursion_limit.is_some() {
            self.config.recursion_limit = config.recursion_limit;
        }
        if let Some(run_name) = config.run_name {
            self.name = Some(run_name.clone());
            self.config.run_name = Some(run_name);
        }
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    fn bind(&self, ctx: &RunContext) -> RunContext {
        ctx.merged(&self.config)
    }
}

#[async_trait]
impl<R: Runnable> Runnable for Bound<R> {
    type Input = R::Input;
    type Output = R::Output;

    fn invoke(&self, input: R::Input, ctx: &RunContext) -> Result<R::Output> {
        self.inner.invoke(input, &self.bind(ctx))
    }

    fn name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.inner.name())
    }

    fn input_type(&self) -> TypeInfo {
        self.inner.input_type()
    }

    fn output_type(&self) -> TypeInfo {
        self.inner.output_type()
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Binding
    }

    async fn ainvoke(self: Arc<Self>, input: R::Input, ctx: RunContext) -> Result<R::Output> {
        let ctx = self.bind(&ctx);
        self.inner.clone().ainvoke(input, ctx).await
    }

    fn batch(&self, inputs: Vec<R::Input>, ctx: &RunContext) -> Result<Vec<R::Output>> {
        self.inner.batch(inputs, &self.bind(ctx))
    }

    fn batch_continue_on_error(
        &self,
        inputs: Vec<R::Input>,
        ctx: &RunContext,
    ) -> Vec<Result<R::Output>> {
        self.inner.batch_continue_on_error(inputs, &self.bind(ctx))
    }

    fn stream<'a>(&'a self, input: R::Input, ctx: RunContext) -> RunStream<'a, R::Output> {
        self.inner.stream(input, self.bind(&ctx))
    }

    fn astream(
        self: Arc<Self>,
        input: R::Input,
        ctx: RunContext,
    ) -> BoxStream<'static, Result<R::Output>> {
        let ctx = self.bind(&ctx);
        self.inner.clone().astream(input, ctx)
    }
}
