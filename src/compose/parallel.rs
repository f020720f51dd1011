//! Parallel composition
//!
//! A [`Parallel`] hands the same input to every named branch and collects
//! the outputs into a map keyed by branch name.

use crate::compose::lambda::Lambda;
use crate::core::{
    context::RunContext,
    error::{Error, Result},
    runnable::{BoxRunnable, ComponentKind, Runnable},
};
use crate::execution::pool::WorkerPool;
use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// Named branches run concurrently on the same input
pub struct Parallel<I, O> {
    branches: BTreeMap<String, BoxRunnable<I, O>>,
    name: Option<String>,
}

/// Builder for [`Parallel`]
pub struct ParallelBuilder<I, O> {
    branches: Vec<(String, BoxRunnable<I, O>)>,
    name: Option<String>,
}

impl<I, O> ParallelBuilder<I, O>
where
    I: Clone + Send + Sync + 'static,
    O: Send + 'static,
{
    pub fn branch<R>(mut self, name: impl Into<String>, component: R) -> Self
    where
        R: Runnable<Input = I, Output = O>,
    {
        self.branches.push((name.into(), Arc::new(component)));
        self
    }

    /// Add a branch that runs a plain function
    pub fn branch_fn<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(I) -> O + Send + Sync + 'static,
    {
        self.branch(name, Lambda::new(f))
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Fails on duplicate branch names or when no branch was added
    pub fn build(self) -> Result<Parallel<I, O>> {
        if self.branches.is_empty() {
            return Err(Error::InvalidComposition(
                "a parallel composition needs at least one branch".to_string(),
            ));
        }

        let mut branches = BTreeMap::new();
        for (name, component) in self.branches {
            if branches.contains_key(&name) {
                return Err(Error::InvalidComposition(format!(
                    "duplicate branch name: {}",
                    name
                )));
            }
            branches.insert(name, component);
        }

        Ok(Parallel {
            branches,
            name: self.name,
        })
    }
}

impl<I, O> Parallel<I, O>
where
    I: Clone + Send + Sync + 'static,
    O: Send + 'static,
{
    pub fn builder() -> ParallelBuilder<I, O> {
        ParallelBuilder {
            branches: Vec::new(),
            name: None,
        }
    }

    /// Build from a map of already shared components
    pub fn from_branches(branches: BTreeMap<String, BoxRunnable<I, O>>) -> Result<Self> {
        if branches.is_empty() {
            return Err(Error::InvalidComposition(
                "a parallel composition needs at least one branch".to_string(),
            ));
        }
        Ok(Self {
            branches,
            name: None,
        })
    }

    pub fn branch_names(&self) -> Vec<&str> {
        self.branches.keys().map(String::as_str).collect()
    }

    pub fn branches(&self) -> &BTreeMap<String, BoxRunnable<I, O>> {
        &self.branches
    }

    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }
}

fn branch_label(key: &str) -> String {
    format!("map:key:{}", key)
}

#[async_trait]
impl<I, O> Runnable for Parallel<I, O>
where
    I: Clone + Send + Sync + 'static,
    O: Send + 'static,
{
    type Input = I;
    type Output = BTreeMap<String, O>;

    fn invoke(&self, input: I, ctx: &RunContext) -> Result<BTreeMap<String, O>> {
        ctx.scope(&self.name(), |ctx| {
            let pool = WorkerPool::for_context(ctx, self.branches.len())?;
            debug!(
                "Running {} branches on {} workers",
                self.branches.len(),
                pool.size()
            );

            let branches: Vec<(&String, &BoxRunnable<I, O>)> = self.branches.iter().collect();
            let outputs = pool.try_map(branches, |(key, branch)| {
                let output = ctx.child_scope(branch_label(key), &branch.name(), |ctx| {
                    branch.invoke(input.clone(), ctx)
                })?;
                Ok((key.clone(), output))
            })?;
            Ok(outputs.into_iter().collect())
        })
    }

    fn name(&self) -> String {
        self.name.clone().unwrap_or_else(|| "Parallel".to_string())
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Parallel
    }

    /// Every branch runs as its own task. The first failure is returned
    /// right away; branches still in flight keep running in the background.
    async fn ainvoke(self: Arc<Self>, input: I, ctx: RunContext) -> Result<BTreeMap<String, O>> {
        let name = self.name();
        let this = self.clone();
        ctx.scope_async(&name, move |ctx| async move {
            let permits = Arc::new(Semaphore::new(
                ctx.max_concurrency().unwrap_or(this.branches.len()).max(1),
            ));

            let mut tasks = FuturesUnordered::new();
            for (key, branch) in &this.branches {
                let key = key.clone();
                let branch = branch.clone();
                let input = input.clone();
                let ctx = ctx.clone();
                let permits = permits.clone();
                tasks.push(tokio::spawn(async move {
                    let _permit = permits
                        .acquire_owned()
                        .await
                        .map_err(|e| Error::Worker(e.to_string()))?;
                    let branch_name = branch.name();
                    let output = ctx
                        .child_scope_async(branch_label(&key), &branch_name, move |ctx| {
                            branch.ainvoke(input, ctx)
                        })
                        .await?;
                    Ok::<_, Error>((key, output))
                }));
            }

            let mut outputs = BTreeMap::new();
            while let Some(joined) = tasks.next().await {
                match joined {
                    Ok(Ok((key, output))) => {
                        outputs.insert(key, output);
                    }
                    Ok(Err(e)) => {
                        if !tasks.is_empty() {
                            warn!("Branch failed, {} branches left running", tasks.len());
                        }
                        return Err(e);
                    }
                    Err(e) => return Err(Error::Worker(format!("Branch task failed: {}", e))),
                }
            }
            Ok(outputs)
        })
        .await
    }
}
