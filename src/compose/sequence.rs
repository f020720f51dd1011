//! Sequential composition
//!
//! A [`Sequence`] feeds the output of each stage into the next. Chaining a
//! sequence onto another splices its stages, so a sequence never contains
//! another sequence.

use crate::core::{
    context::RunContext,
    error::{Error, Result},
    runnable::{ComponentKind, RunStream, Runnable, TypeInfo},
};
use crate::execution::{
    erased::{flatten, stages_of, Payload, Stage},
    pool::WorkerPool,
};
use async_trait::async_trait;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

/// Ordered chain of stages; stage k+1 starts only after stage k returned
pub struct Sequence<I, O> {
    stages: Vec<Stage>,
    name: Option<String>,
    _types: PhantomData<fn(I) -> O>,
}

impl<I, O> Sequence<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    /// Chain two components. Adjacent types are checked by the compiler.
    pub fn pair<A, B>(first: A, second: B) -> Self
    where
        A: Runnable<Input = I>,
        B: Runnable<Input = A::Output, Output = O>,
    {
        let mut stages = stages_of(first);
        stages.extend(stages_of(second));
        Self {
            stages,
            name: None,
            _types: PhantomData,
        }
    }

    /// Build a sequence from already erased stages.
    ///
    /// Nested sequences are flattened. Fails for fewer than two stages or
    /// when neighbouring stage types do not line up.
    pub fn from_stages(stages: Vec<Stage>) -> Result<Self> {
        let stages: Vec<Stage> = stages.into_iter().flat_map(flatten).collect();
        if stages.len() < 2 {
            return Err(Error::InvalidComposition(format!(
                "a sequence needs at least 2 stages, got {}",
                stages.len()
            )));
        }

        check_type("sequence input", TypeInfo::of::<I>(), stages[0].input_type())?;
        for pair in stages.windows(2) {
            check_type(
                &format!("{} -> {}", pair[0].name(), pair[1].name()),
                pair[0].output_type(),
                pair[1].input_type(),
            )?;
        }
        check_type(
            "sequence output",
            stages[stages.len() - 1].output_type(),
            TypeInfo::of::<O>(),
        )?;

        Ok(Self {
            stages,
            name: None,
            _types: PhantomData,
        })
    }

    /// Append another component
    pub fn then<N>(self, next: N) -> Sequence<I, N::Output>
    where
        N: Runnable<Input = O>,
    {
        let mut stages = self.stages;
        stages.extend(stages_of(next));
        Sequence {
            stages,
            name: self.name,
            _types: PhantomData,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn first(&self) -> &Stage {
        &self.stages[0]
    }

    /// Stages between the first and the last
    pub fn middle(&self) -> &[Stage] {
        &self.stages[1..self.stages.len() - 1]
    }

    pub fn last(&self) -> &Stage {
        &self.stages[self.stages.len() - 1]
    }

    pub fn steps(&self) -> &[Stage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Names of all stages, in order
    pub fn stage_names(&self) -> Vec<String> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    fn output_name(&self) -> String {
        self.name()
    }
}

fn check_type(what: &str, produced: TypeInfo, expected: TypeInfo) -> Result<()> {
    if produced == expected {
        Ok(())
    } else {
        Err(Error::InvalidComposition(format!(
            "type mismatch at {}: {} does not match {}",
            what, produced, expected
        )))
    }
}

fn step_label(index: usize) -> String {
    format!("seq:step:{}", index + 1)
}

#[async_trait]
impl<I, O> Runnable for Sequence<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    type Input = I;
    type Output = O;

    fn invoke(&self, input: I, ctx: &RunContext) -> Result<O> {
        let name = self.output_name();
        ctx.scope(&name, |ctx| {
            let mut value = Payload::new(input);
            for (index, stage) in self.stages.iter().enumerate() {
                debug!("Running stage {}: {}", index + 1, stage.name());
                value = ctx.child_scope(step_label(index), &stage.name(), |ctx| {
                    stage.invoke_any(value, ctx)
                })?;
            }
            value.downcast::<O>(&name)
        })
    }

    fn name(&self) -> String {
        self.name.clone().unwrap_or_else(|| "Sequence".to_string())
    }

    fn input_type(&self) -> TypeInfo {
        self.first().input_type()
    }

    fn output_type(&self) -> TypeInfo {
        self.last().output_type()
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Sequence
    }

    fn sequence_stages(&self) -> Option<&[Stage]> {
        Some(&self.stages)
    }

    async fn ainvoke(self: Arc<Self>, input: I, ctx: RunContext) -> Result<O> {
        let name = self.output_name();
        let this = self.clone();
        ctx.scope_async(&name, move |ctx| async move {
            let mut value = Payload::new(input);
            for (index, stage) in this.stages.iter().enumerate() {
                let stage = stage.clone();
                value = ctx
                    .child_scope_async(step_label(index), &stage.name(), move |ctx| {
                        stage.ainvoke_any(value, ctx)
                    })
                    .await?;
            }
            value.downcast::<O>(&this.output_name())
        })
        .await
    }

    /// Stage-wise batching: every stage processes the whole intermediate
    /// list before the next one starts. With listeners attached each input
    /// runs on its own so that every input gets a complete span tree.
    fn batch(&self, inputs: Vec<I>, ctx: &RunContext) -> Result<Vec<O>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        if ctx.is_traced() {
            let pool = WorkerPool::for_context(ctx, inputs.len())?;
            let item_ctx = ctx.batch_item();
            return pool.try_map(inputs, |input| self.invoke(input, &item_ctx));
        }

        let mut values: Vec<Payload> = inputs.into_iter().map(Payload::new).collect();
        for (index, stage) in self.stages.iter().enumerate() {
            values = stage.batch_any(values, &ctx.child(step_label(index)))?;
        }
        let name = self.output_name();
        values
            .into_iter()
            .map(|value| value.downcast::<O>(&name))
            .collect()
    }

    fn stream<'a>(&'a self, input: I, ctx: RunContext) -> RunStream<'a, O> {
        let name = self.output_name();
        ctx.stream_scope(name.clone(), move |ctx| {
            let (last, init) = match self.stages.split_last() {
                Some(split) => split,
                None => {
                    return Box::new(std::iter::once(Err(Error::InvalidComposition(
                        "empty sequence".to_string(),
                    ))))
                }
            };

            let mut value = Payload::new(input);
            for (index, stage) in init.iter().enumerate() {
                let result = ctx.child_scope(step_label(index), &stage.name(), |ctx| {
                    stage.invoke_any(value, ctx)
                });
                value = match result {
                    Ok(value) => value,
                    Err(e) => return Box::new(std::iter::once(Err(e))),
                };
            }

            let stream = ctx.child_stream_scope(step_label(init.len()), last.name(), move |ctx| {
                last.stream_any(value, ctx)
            });
            Box::new(stream.map(move |item| item.and_then(|value| value.downcast::<O>(&name))))
        })
    }
}
