//! Type-erased stages
//!
//! Sequences hold stages of different types in one list. Each stage is
//! wrapped in [`Erased`], which moves values across the boundary as
//! [`Payload`]s and checks their type on the way in.

use crate::core::{
    context::RunContext,
    error::{Error, Result},
    runnable::{ComponentKind, RunStream, Runnable, TypeInfo},
};
use futures::future::BoxFuture;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A value travelling between erased stages
pub struct Payload {
    value: Box<dyn Any + Send>,
    type_name: &'static str,
}

impl Payload {
    pub fn new<T: Send + 'static>(value: T) -> Self {
        Self {
            value: Box::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Recover the typed value, failing with [`Error::TypeMismatch`]
    pub fn downcast<T: 'static>(self, component: &str) -> Result<T> {
        let actual = self.type_name;
        self.value
            .downcast::<T>()
            .map(|value| *value)
            .map_err(|_| Error::TypeMismatch {
                component: component.to_string(),
                expected: std::any::type_name::<T>(),
                actual,
            })
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Payload<{}>", self.type_name)
    }
}

/// Object-safe view of a [`Runnable`] operating on [`Payload`]s
pub trait ErasedRunnable: Send + Sync {
    fn name(&self) -> String;
    fn kind(&self) -> ComponentKind;
    fn input_type(&self) -> TypeInfo;
    fn output_type(&self) -> TypeInfo;

    /// Inner stages when the wrapped component is itself a sequence
    fn stages(&self) -> Option<&[Stage]>;

    fn invoke_any(&self, input: Payload, ctx: &RunContext) -> Result<Payload>;
    fn batch_any(&self, inputs: Vec<Payload>, ctx: &RunContext) -> Result<Vec<Payload>>;
    fn stream_any<'a>(&'a self, input: Payload, ctx: RunContext) -> RunStream<'a, Payload>;
    fn ainvoke_any(&self, input: Payload, ctx: RunContext) -> BoxFuture<'static, Result<Payload>>;
}

/// A stage of a sequence
pub type Stage = Arc<dyn ErasedRunnable>;

/// Adapter from a typed component to [`ErasedRunnable`]
pub struct Erased<R: ?Sized>(Arc<R>);

impl<R: Runnable> Erased<R> {
    /// Erase a component into a single stage
    pub fn stage(component: R) -> Stage {
        Arc::new(Erased(Arc::new(component)))
    }
}

impl<R: Runnable + ?Sized> Erased<R> {
    /// Erase a shared component into a single stage
    pub fn shared(component: Arc<R>) -> Stage {
        Arc::new(Erased(component))
    }
}

impl<R: Runnable + ?Sized> ErasedRunnable for Erased<R> {
    fn name(&self) -> String {
        self.0.name()
    }

    fn kind(&self) -> ComponentKind {
        self.0.kind()
    }

    fn input_type(&self) -> TypeInfo {
        self.0.input_type()
    }

    fn output_type(&self) -> TypeInfo {
        self.0.output_type()
    }

    fn stages(&self) -> Option<&[Stage]> {
        self.0.sequence_stages()
    }

    fn invoke_any(&self, input: Payload, ctx: &RunContext) -> Result<Payload> {
        let input = input.downcast::<R::Input>(&self.0.name())?;
        self.0.invoke(input, ctx).map(Payload::new)
    }

    fn batch_any(&self, inputs: Vec<Payload>, ctx: &RunContext) -> Result<Vec<Payload>> {
        let name = self.0.name();
        let inputs = inputs
            .into_iter()
            .map(|input| input.downcast::<R::Input>(&name))
            .collect::<Result<Vec<_>>>()?;
        let outputs = self.0.batch(inputs, ctx)?;
        Ok(outputs.into_iter().map(Payload::new).collect())
    }

    fn stream_any<'a>(&'a self, input: Payload, ctx: RunContext) -> RunStream<'a, Payload> {
        match input.downcast::<R::Input>(&self.0.name()) {
            Ok(input) => Box::new(
                self.0
                    .stream(input, ctx)
                    .map(|item| item.map(Payload::new)),
            ),
            Err(e) => Box::new(std::iter::once(Err(e))),
        }
    }

    fn ainvoke_any(&self, input: Payload, ctx: RunContext) -> BoxFuture<'static, Result<Payload>> {
        let component = self.0.clone();
        Box::pin(async move {
            let input = input.downcast::<R::Input>(&component.name())?;
            component.ainvoke(input, ctx).await.map(Payload::new)
        })
    }
}

/// Stages of a component, spliced when it is a sequence
pub fn stages_of<R: Runnable>(component: R) -> Vec<Stage> {
    match component.sequence_stages() {
        Some(stages) => stages.to_vec(),
        None => vec![Erased::stage(component)],
    }
}

/// Stages of an erased stage, spliced when it wraps a sequence
pub fn flatten(stage: Stage) -> Vec<Stage> {
    match stage.stages() {
        Some(stages) => stages.to_vec(),
        None => vec![stage],
    }
}
