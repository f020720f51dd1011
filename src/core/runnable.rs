//! The component contract
//!
//! Every stage in a pipeline implements [`Runnable`]. Only [`Runnable::invoke`]
//! is required; async invocation, batching and streaming are derived from it
//! and can be overridden by components that have a native implementation.

use crate::core::{
    context::RunContext,
    error::{Error, Result},
};
use crate::execution::{
    erased::Stage,
    pool::{self, WorkerPool},
};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

/// Shared, type-erased handle to a component
pub type BoxRunnable<I, O> = Arc<dyn Runnable<Input = I, Output = O>>;

/// Lazy, single-pass sequence of partial outputs
pub type RunStream<'a, T> = Box<dyn Iterator<Item = Result<T>> + Send + 'a>;

/// Declared type of a component's input or output
///
/// `serde_json::Value` is the dynamic "accepts anything" type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeInfo {
    id: TypeId,
    name: &'static str,
}

impl TypeInfo {
    /// Type information for `T`
    pub fn of<T: 'static + ?Sized>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The untyped (dynamic value) type
    pub fn any() -> Self {
        Self::of::<serde_json::Value>()
    }

    /// Whether this is the untyped type
    pub fn is_any(&self) -> bool {
        self.id == TypeId::of::<serde_json::Value>()
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Human readable type name, `any` for the untyped type
    pub fn name(&self) -> &'static str {
        if self.is_any() {
            "any"
        } else {
            self.name
        }
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Structural kind of a component, used for graph introspection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    /// User-defined component
    Leaf,
    /// Function adapter
    Lambda,
    /// Sequential composition
    Sequence,
    /// Parallel composition
    Parallel,
    /// Identity component
    Passthrough,
    /// Conditional routing
    Branch,
    /// Component with bound configuration
    Binding,
    /// Component mapped over a list of inputs
    Each,
    /// Component wrapped with retries
    Retry,
    /// Component with fallback alternatives
    Fallbacks,
}

/// Outcome of one routing hop, see [`Runnable::route`]
pub enum Dispatch<I, O> {
    /// The component produced its output
    Done(O),
    /// The component handed its input over to another component
    Forward(BoxRunnable<I, O>, I),
}

/// A typed unit of work
#[async_trait]
pub trait Runnable: Send + Sync + 'static {
    type Input: Send + 'static;
    type Output: Send + 'static;

    /// Transform a single input
    fn invoke(&self, input: Self::Input, ctx: &RunContext) -> Result<Self::Output>;

    /// Human-readable name used in traces
    fn name(&self) -> String {
        short_type_name(std::any::type_name::<Self>())
    }

    fn input_type(&self) -> TypeInfo {
        TypeInfo::of::<Self::Input>()
    }

    fn output_type(&self) -> TypeInfo {
        TypeInfo::of::<Self::Output>()
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Leaf
    }

    /// Internal stage list when this component is a sequential composition.
    ///
    /// Chaining splices these stages instead of nesting the sequence.
    #[doc(hidden)]
    fn sequence_stages(&self) -> Option<&[Stage]> {
        None
    }

    /// Resolve one routing hop.
    ///
    /// Components that decide at run time which component handles the input
    /// return [`Dispatch::Forward`]; everything else completes immediately.
    fn route(
        &self,
        input: Self::Input,
        ctx: &RunContext,
    ) -> Result<Dispatch<Self::Input, Self::Output>> {
        self.invoke(input, ctx).map(Dispatch::Done)
    }

    /// Async invocation; by default runs `invoke` on the blocking pool
    async fn ainvoke(self: Arc<Self>, input: Self::Input, ctx: RunContext) -> Result<Self::Output> {
        pool::run_blocking(move || self.invoke(input, &ctx)).await
    }

    /// Invoke on every input, preserving order. The first error aborts the batch.
    fn batch(&self, inputs: Vec<Self::Input>, ctx: &RunContext) -> Result<Vec<Self::Output>> {
        match inputs.len() {
            0 => Ok(Vec::new()),
            1 => inputs
                .into_iter()
                .map(|input| self.invoke(input, ctx))
                .collect(),
            units => {
                let pool = WorkerPool::for_context(ctx, units)?;
                let item_ctx = ctx.batch_item();
                pool.try_map(inputs, |input| self.invoke(input, &item_ctx))
            }
        }
    }

    /// Like [`Runnable::batch`], but failing inputs leave their error in place
    fn batch_continue_on_error(
        &self,
        inputs: Vec<Self::Input>,
        ctx: &RunContext,
    ) -> Vec<Result<Self::Output>> {
        match inputs.len() {
            0 => Vec::new(),
            1 => inputs
                .into_iter()
                .map(|input| self.invoke(input, ctx))
                .collect(),
            units => match WorkerPool::for_context(ctx, units) {
                Ok(pool) => {
                    let item_ctx = ctx.batch_item();
                    pool.map(inputs, |input| self.invoke(input, &item_ctx))
                }
                Err(e) => {
                    let message = e.to_string();
                    inputs
                        .into_iter()
                        .map(|_| Err(Error::Worker(message.clone())))
                        .collect()
                }
            },
        }
    }

    /// Async batch, at most `max_concurrency` invocations in flight
    async fn abatch(
        self: Arc<Self>,
        inputs: Vec<Self::Input>,
        ctx: RunContext,
    ) -> Result<Vec<Self::Output>> {
        let limit = concurrency_limit(&ctx, inputs.len());
        let item_ctx = ctx.batch_item();
        stream::iter(
            inputs
                .into_iter()
                .map(|input| self.clone().ainvoke(input, item_ctx.clone())),
        )
        .buffered(limit)
        .try_collect()
        .await
    }

    /// Async batch keeping per-input errors
    async fn abatch_continue_on_error(
        self: Arc<Self>,
        inputs: Vec<Self::Input>,
        ctx: RunContext,
    ) -> Vec<Result<Self::Output>> {
        let limit = concurrency_limit(&ctx, inputs.len());
        let item_ctx = ctx.batch_item();
        stream::iter(
            inputs
                .into_iter()
                .map(|input| self.clone().ainvoke(input, item_ctx.clone())),
        )
        .buffered(limit)
        .collect()
        .await
    }

    /// Stream partial outputs. The default yields the full output once,
    /// computed when the stream is first polled.
    fn stream<'a>(&'a self, input: Self::Input, ctx: RunContext) -> RunStream<'a, Self::Output> {
        Box::new(std::iter::once_with(move || self.invoke(input, &ctx)))
    }

    /// Async counterpart of [`Runnable::stream`]
    fn astream(
        self: Arc<Self>,
        input: Self::Input,
        ctx: RunContext,
    ) -> BoxStream<'static, Result<Self::Output>> {
        stream::once(self.ainvoke(input, ctx)).boxed()
    }
}

#[async_trait]
impl<R> Runnable for Arc<R>
where
    R: Runnable + ?Sized,
{
    type Input = R::Input;
    type Output = R::Output;

    fn invoke(&self, input: Self::Input, ctx: &RunContext) -> Result<Self::Output> {
        (**self).invoke(input, ctx)
    }

    fn name(&self) -> String {
        (**self).name()
    }

    fn input_type(&self) -> TypeInfo {
        (**self).input_type()
    }

    fn output_type(&self) -> TypeInfo {
        (**self).output_type()
    }

    fn kind(&self) -> ComponentKind {
        (**self).kind()
    }

    fn sequence_stages(&self) -> Option<&[Stage]> {
        (**self).sequence_stages()
    }

    fn route(
        &self,
        input: Self::Input,
        ctx: &RunContext,
    ) -> Result<Dispatch<Self::Input, Self::Output>> {
        (**self).route(input, ctx)
    }

    async fn ainvoke(self: Arc<Self>, input: Self::Input, ctx: RunContext) -> Result<Self::Output> {
        let inner: Arc<R> = (*self).clone();
        inner.ainvoke(input, ctx).await
    }

    fn batch(&self, inputs: Vec<Self::Input>, ctx: &RunContext) -> Result<Vec<Self::Output>> {
        (**self).batch(inputs, ctx)
    }

    fn batch_continue_on_error(
        &self,
        inputs: Vec<Self::Input>,
        ctx: &RunContext,
    ) -> Vec<Result<Self::Output>> {
        (**self).batch_continue_on_error(inputs, ctx)
    }

    async fn abatch(
        self: Arc<Self>,
        inputs: Vec<Self::Input>,
        ctx: RunContext,
    ) -> Result<Vec<Self::Output>> {
        let inner: Arc<R> = (*self).clone();
        inner.abatch(inputs, ctx).await
    }

    async fn abatch_continue_on_error(
        self: Arc<Self>,
        inputs: Vec<Self::Input>,
        ctx: RunContext,
    ) -> Vec<Result<Self::Output>> {
        let inner: Arc<R> = (*self).clone();
        inner.abatch_continue_on_error(inputs, ctx).await
    }

    fn stream<'a>(&'a self, input: Self::Input, ctx: RunContext) -> RunStream<'a, Self::Output> {
        (**self).stream(input, ctx)
    }

    fn astream(
        self: Arc<Self>,
        input: Self::Input,
        ctx: RunContext,
    ) -> BoxStream<'static, Result<Self::Output>> {
        let inner: Arc<R> = (*self).clone();
        inner.astream(input, ctx)
    }
}

fn concurrency_limit(ctx: &RunContext, units: usize) -> usize {
    ctx.max_concurrency()
        .map_or(units, |limit| limit.min(units))
        .max(1)
}

/// Strip module paths and generic arguments from a type name
pub(crate) fn short_type_name(full: &str) -> String {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}
