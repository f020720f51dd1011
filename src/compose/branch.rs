//! Conditional routing
//!
//! A [`Branch`] checks its conditions in order and runs the component paired
//! with the first one that holds, or the default component when none does.

use crate::core::{
    context::RunContext,
    error::{Error, Result},
    runnable::{BoxRunnable, ComponentKind, Runnable},
};
use async_trait::async_trait;
use std::sync::Arc;

type Condition<I> = Arc<dyn Fn(&I) -> bool + Send + Sync>;

pub struct Branch<I, O> {
    arms: Vec<(Condition<I>, BoxRunnable<I, O>)>,
    default: BoxRunnable<I, O>,
}

pub struct BranchBuilder<I, O> {
    arms: Vec<(Condition<I>, BoxRunnable<I, O>)>,
}

impl<I, O> BranchBuilder<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    /// Add a condition and the component to run when it holds
    pub fn when<P, R>(mut self, condition: P, component: R) -> Self
    where
        P: Fn(&I) -> bool + Send + Sync + 'static,
        R: Runnable<Input = I, Output = O>,
    {
        self.arms.push((Arc::new(condition), Arc::new(component)));
        self
    }

    /// Finish with the component used when no condition holds
    pub fn otherwise<R>(self, component: R) -> Result<Branch<I, O>>
    where
        R: Runnable<Input = I, Output = O>,
    {
        if self.arms.is_empty() {
            return Err(Error::InvalidComposition(
                "a branch needs at least one condition".to_string(),
            ));
        }
        Ok(Branch {
            arms: self.arms,
            default: Arc::new(component),
        })
    }
}

impl<I, O> Branch<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    pub fn builder() -> BranchBuilder<I, O> {
        BranchBuilder { arms: Vec::new() }
    }

    /// Pick the component for an input, with the label of its span
    fn select(&self, input: &I) -> (String, &BoxRunnable<I, O>) {
        self.arms
            .iter()
            .enumerate()
            .find(|(_, (condition, _))| condition(input))
            .map(|(index, (_, component))| (format!("branch:{}", index + 1), component))
            .unwrap_or_else(|| ("branch:default".to_string(), &self.default))
    }
}

#[async_trait]
impl<I, O> Runnable for Branch<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    type Input = I;
    type Output = O;

    fn invoke(&self, input: I, ctx: &RunContext) -> Result<O> {
        ctx.scope("Branch", |ctx| {
            let (label, component) = self.select(&input);
            ctx.child_scope(label, &component.name(), |ctx| component.invoke(input, ctx))
        })
    }

    fn name(&self) -> String {
        "Branch".to_string()
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Branch
    }

    async fn ainvoke(self: Arc<Self>, input: I, ctx: RunContext) -> Result<O> {
        let (label, component) = {
            let (label, component) = self.select(&input);
            (label, component.clone())
        };
        let component_name = component.name();
        ctx.scope_async("Branch", move |ctx| async move {
            ctx.child_scope_async(label, &component_name, move |ctx| {
                component.ainvoke(input, ctx)
            })
            .await
        })
        .await
    }
}
