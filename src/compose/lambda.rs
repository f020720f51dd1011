//! Function adapter
//!
//! [`Lambda`] lifts plain functions and closures into components. The flavour
//! of function (sync, async, generator, routing) is fixed at construction and
//! decides how each entry point of the [`Runnable`] contract behaves:
//!
//! | flavour     | `invoke`                  | `ainvoke`            | `stream`            |
//! |-------------|---------------------------|----------------------|---------------------|
//! | sync        | calls the function        | blocking pool        | one item            |
//! | async       | [`Error::AsyncOnly`]      | awaits natively      | one item            |
//! | generator   | folds every chunk         | blocking pool        | one item per chunk  |
//! | routing     | re-dispatches the input   | re-dispatches async  | streams the target  |
//!
//! A sync lambda can carry a native async twin (see [`Lambda::with_async`]).

use crate::core::{
    chunk::Accumulate,
    context::RunContext,
    error::{Error, Result},
    runnable::{short_type_name, BoxRunnable, ComponentKind, Dispatch, RunStream, Runnable},
};
use crate::execution::{
    pool::{self, stream_detached},
    span::ActiveSpan,
};
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

type SyncFn<I, O> = Arc<dyn Fn(I, &RunContext) -> Result<O> + Send + Sync>;
type AsyncFn<I, O> = Arc<dyn Fn(I, RunContext) -> BoxFuture<'static, Result<O>> + Send + Sync>;
type Chunks<O> = Box<dyn Iterator<Item = O> + Send>;
type GeneratorFn<I, O> = Arc<dyn Fn(I, &RunContext) -> Result<Chunks<O>> + Send + Sync>;
type RouteFn<I, O> = Arc<dyn Fn(&I, &RunContext) -> Result<Route<I, O>> + Send + Sync>;

/// Result of a routing function
pub enum Route<I, O> {
    /// The function produced the output itself
    Done(O),
    /// Hand the same input to another component
    To(BoxRunnable<I, O>),
}

impl<I, O> Route<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    pub fn to<R>(component: R) -> Self
    where
        R: Runnable<Input = I, Output = O>,
    {
        Route::To(Arc::new(component))
    }
}

enum Fold<O> {
    Merge(fn(O, O) -> O),
    Latest,
}

enum Body<I, O> {
    Sync(SyncFn<I, O>),
    Async(AsyncFn<I, O>),
    Generator { produce: GeneratorFn<I, O>, fold: Fold<O> },
    Routing(RouteFn<I, O>),
}

/// A component backed by a function
pub struct Lambda<I, O> {
    body: Body<I, O>,
    async_twin: Option<AsyncFn<I, O>>,
    name: String,
}

/// Lift a plain function into a component
pub fn lambda<I, O, F>(f: F) -> Lambda<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
    F: Fn(I) -> O + Send + Sync + 'static,
{
    Lambda::new(f)
}

impl<I, O> Lambda<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    fn from_body<F>(body: Body<I, O>) -> Self {
        Self {
            body,
            async_twin: None,
            name: function_name::<F>(),
        }
    }

    /// Infallible synchronous function
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(I) -> O + Send + Sync + 'static,
    {
        Self::from_body::<F>(Body::Sync(Arc::new(
            move |input: I, _ctx: &RunContext| -> Result<O> { Ok(f(input)) },
        )))
    }

    /// Fallible synchronous function
    pub fn try_new<F>(f: F) -> Self
    where
        F: Fn(I) -> Result<O> + Send + Sync + 'static,
    {
        Self::from_body::<F>(Body::Sync(Arc::new(
            move |input: I, _ctx: &RunContext| -> Result<O> { f(input) },
        )))
    }

    /// Synchronous function that also receives the run context
    pub fn with_context<F>(f: F) -> Self
    where
        F: Fn(I, &RunContext) -> Result<O> + Send + Sync + 'static,
    {
        Self::from_body::<F>(Body::Sync(Arc::new(f)))
    }

    /// Async function. Calling `invoke` on the result fails with
    /// [`Error::AsyncOnly`].
    pub fn new_async<F, Fut>(f: F) -> Self
    where
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O>> + Send + 'static,
    {
        Self::from_body::<F>(Body::Async(Arc::new(
            move |input: I, _ctx: RunContext| -> BoxFuture<'static, Result<O>> {
                Box::pin(f(input))
            },
        )))
    }

    /// Async function that also receives the run context
    pub fn async_with_context<F, Fut>(f: F) -> Self
    where
        F: Fn(I, RunContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O>> + Send + 'static,
    {
        Self::from_body::<F>(Body::Async(Arc::new(
            move |input: I, ctx: RunContext| -> BoxFuture<'static, Result<O>> {
                Box::pin(f(input, ctx))
            },
        )))
    }

    /// Generator function. `invoke` folds all chunks with
    /// [`Accumulate::accumulate`]; `stream` yields them one by one.
    pub fn generator<F, It>(f: F) -> Self
    where
        O: Accumulate,
        F: Fn(I) -> It + Send + Sync + 'static,
        It: IntoIterator<Item = O>,
        It::IntoIter: Send + 'static,
    {
        Self::from_body::<F>(Body::Generator {
            produce: generator_fn(f),
            fold: Fold::Merge(O::accumulate),
        })
    }

    /// Generator function whose `invoke` result is the last chunk
    pub fn generator_latest<F, It>(f: F) -> Self
    where
        F: Fn(I) -> It + Send + Sync + 'static,
        It: IntoIterator<Item = O>,
        It::IntoIter: Send + 'static,
    {
        Self::from_body::<F>(Body::Generator {
            produce: generator_fn(f),
            fold: Fold::Latest,
        })
    }

    /// Function that may hand its input over to another component.
    ///
    /// Every hand-over consumes one unit of the recursion budget and runs the
    /// target in a child context labeled `dispatch:N`.
    pub fn routing<F>(f: F) -> Self
    where
        F: Fn(&I, &RunContext) -> Result<Route<I, O>> + Send + Sync + 'static,
    {
        Self::from_body::<F>(Body::Routing(Arc::new(f)))
    }

    /// Attach a native async implementation used by `ainvoke`
    pub fn with_async<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O>> + Send + 'static,
    {
        self.async_twin = Some(Arc::new(
            move |input: I, _ctx: RunContext| -> BoxFuture<'static, Result<O>> {
                Box::pin(f(input))
            },
        ));
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Whether `ainvoke` awaits natively instead of using the blocking pool
    pub fn is_async(&self) -> bool {
        self.async_twin.is_some() || matches!(self.body, Body::Async(_))
    }

    fn call(&self, input: I, ctx: &RunContext) -> Result<O> {
        match &self.body {
            Body::Sync(f) => f(input, ctx),
            Body::Async(_) => Err(Error::AsyncOnly(self.name.clone())),
            Body::Generator { produce, fold } => {
                let mut output: Option<O> = None;
                for chunk in produce(input, ctx)? {
                    output = Some(match (output, fold) {
                        (Some(previous), Fold::Merge(merge)) => merge(previous, chunk),
                        _ => chunk,
                    });
                }
                output.ok_or_else(|| Error::component(format!("{} produced no output", self.name)))
            }
            Body::Routing(_) => self.dispatch(input, ctx),
        }
    }

    /// Follow hand-overs until some component produces an output
    fn dispatch(&self, input: I, ctx: &RunContext) -> Result<O> {
        let mut hops: Vec<ActiveSpan> = Vec::new();
        let mut ctx = ctx.clone();
        let mut step = self.route(input, &ctx);

        let result = loop {
            match step {
                Err(e) => break Err(e),
                Ok(Dispatch::Done(output)) => break Ok(output),
                Ok(Dispatch::Forward(next, input)) => {
                    if ctx.recursion_limit() == 0 {
                        break Err(self.recursion_error(&ctx));
                    }
                    let child = ctx.child(dispatch_label(&ctx));
                    debug!("{} dispatching to {}", self.name, next.name());
                    hops.push(ActiveSpan::open(&child, &next.name()));
                    step = next.route(input, &child);
                    ctx = child;
                }
            }
        };

        for span in hops.into_iter().rev() {
            span.finish(&result);
        }
        result
    }

    fn recursion_error(&self, ctx: &RunContext) -> Error {
        Error::RecursionLimit {
            component: self.name.clone(),
            limit: ctx.recursion_budget(),
        }
    }
}

#[async_trait]
impl<I, O> Runnable for Lambda<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    type Input = I;
    type Output = O;

    fn invoke(&self, input: I, ctx: &RunContext) -> Result<O> {
        ctx.scope(&self.name, |ctx| self.call(input, ctx))
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Lambda
    }

    fn route(&self, input: I, ctx: &RunContext) -> Result<Dispatch<I, O>> {
        match &self.body {
            Body::Routing(f) => Ok(match f(&input, ctx)? {
                Route::Done(output) => Dispatch::Done(output),
                Route::To(next) => Dispatch::Forward(next, input),
            }),
            _ => self.call(input, ctx).map(Dispatch::Done),
        }
    }

    async fn ainvoke(self: Arc<Self>, input: I, ctx: RunContext) -> Result<O> {
        let name = self.name.clone();
        match (&self.async_twin, &self.body) {
            (Some(f), _) | (None, Body::Async(f)) => {
                let f = f.clone();
                ctx.scope_async(&name, move |ctx| f(input, ctx)).await
            }
            (None, Body::Routing(_)) => {
                let this = self.clone();
                ctx.scope_async(&name, move |ctx| async move {
                    match this.route(input, &ctx)? {
                        Dispatch::Done(output) => Ok(output),
                        Dispatch::Forward(next, input) => {
                            if ctx.recursion_limit() == 0 {
                                return Err(this.recursion_error(&ctx));
                            }
                            let next_name = next.name();
                            ctx.child_scope_async(dispatch_label(&ctx), &next_name, move |child| {
                                next.ainvoke(input, child)
                            })
                            .await
                        }
                    }
                })
                .await
            }
            _ => {
                let this = self.clone();
                pool::run_blocking(move || this.invoke(input, &ctx)).await
            }
        }
    }

    fn stream<'a>(&'a self, input: I, ctx: RunContext) -> RunStream<'a, O> {
        match &self.body {
            Body::Generator { produce, .. } => {
                ctx.stream_scope(self.name.clone(), move |ctx| match produce(input, &ctx) {
                    Ok(chunks) => Box::new(chunks.map(Ok)),
                    Err(e) => Box::new(std::iter::once(Err(e))),
                })
            }
            Body::Routing(_) => ctx.stream_scope(self.name.clone(), move |ctx| {
                match self.route(input, &ctx) {
                    Err(e) => Box::new(std::iter::once(Err(e))),
                    Ok(Dispatch::Done(output)) => Box::new(std::iter::once(Ok(output))),
                    Ok(Dispatch::Forward(next, input)) => {
                        if ctx.recursion_limit() == 0 {
                            return Box::new(std::iter::once(Err(self.recursion_error(&ctx))));
                        }
                        let next_name = next.name();
                        ctx.child_stream_scope(dispatch_label(&ctx), next_name, move |child| {
                            stream_detached(move |tx| {
                                for item in next.stream(input, child) {
                                    if tx.send(item).is_err() {
                                        break;
                                    }
                                }
                            })
                        })
                    }
                }
            }),
            _ => Box::new(std::iter::once_with(move || self.invoke(input, &ctx))),
        }
    }
}

fn generator_fn<I, O, F, It>(f: F) -> GeneratorFn<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
    F: Fn(I) -> It + Send + Sync + 'static,
    It: IntoIterator<Item = O>,
    It::IntoIter: Send + 'static,
{
    Arc::new(move |input: I, _ctx: &RunContext| -> Result<Chunks<O>> {
        Ok(Box::new(f(input).into_iter()))
    })
}

/// Function items keep their own name, closures are called `Lambda`
fn function_name<F>() -> String {
    let full = std::any::type_name::<F>();
    if full.contains("{{closure}}") {
        "Lambda".to_string()
    } else {
        short_type_name(full)
    }
}

/// Position of this context in an unbroken chain of hand-overs
fn dispatch_depth(ctx: &RunContext) -> usize {
    ctx.label()
        .and_then(|label| label.strip_prefix("dispatch:"))
        .and_then(|depth| depth.parse().ok())
        .unwrap_or(0)
}

fn dispatch_label(ctx: &RunContext) -> String {
    format!("dispatch:{}", dispatch_depth(ctx) + 1)
}
