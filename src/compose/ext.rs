//! Composition operators available on every component

use crate::compose::{
    binding::Bound, each::Each, fallbacks::Fallbacks, lambda::Lambda, retry::Retry,
    sequence::Sequence,
};
use crate::core::{
    config::RunConfig,
    runnable::{BoxRunnable, Runnable},
};
use serde_json::Value;
use std::sync::Arc;

/// Builder-style combinators for [`Runnable`]s
///
/// Every combinator consumes the component and returns a new one; the
/// original is never modified.
pub trait RunnableExt: Runnable + Sized {
    /// Feed this component's output into `next`
    fn then<N>(self, next: N) -> Sequence<Self::Input, N::Output>
    where
        N: Runnable<Input = Self::Output>,
    {
        Sequence::pair(self, next)
    }

    /// Feed this component's output into a plain function
    fn then_fn<F, O>(self, f: F) -> Sequence<Self::Input, O>
    where
        F: Fn(Self::Output) -> O + Send + Sync + 'static,
        O: Send + 'static,
    {
        Sequence::pair(self, Lambda::new(f))
    }

    /// Share behind a type-erased handle
    fn boxed(self) -> BoxRunnable<Self::Input, Self::Output> {
        Arc::new(self)
    }

    fn with_config(self, config: RunConfig) -> Bound<Self> {
        Bound::new(self, config)
    }

    fn with_name(self, name: impl Into<String>) -> Bound<Self> {
        Bound::new(self, RunConfig::default()).with_name(name)
    }

    fn with_tags<T>(self, tags: impl IntoIterator<Item = T>) -> Bound<Self>
    where
        T: Into<String>,
    {
        let config = RunConfig {
            tags: tags.into_iter().map(Into::into).collect(),
            ..RunConfig::default()
        };
        Bound::new(self, config)
    }

    fn with_metadata(self, key: impl Into<String>, value: impl Into<Value>) -> Bound<Self> {
        Bound::new(self, RunConfig::default().with_metadata(key, value))
    }

    /// Retry failed invocations, up to `max_attempts` attempts in total
    fn with_retry(self, max_attempts: usize) -> Retry<Self> {
        Retry::new(self, max_attempts)
    }

    /// Try `fallbacks` in order when this component fails
    fn with_fallbacks(
        self,
        fallbacks: Vec<BoxRunnable<Self::Input, Self::Output>>,
    ) -> Fallbacks<Self::Input, Self::Output>
    where
        Self::Input: Clone,
    {
        Fallbacks::new(Arc::new(self), fallbacks)
    }

    /// Apply this component to every element of a list
    fn map_each(self) -> Each<Self> {
        Each::new(self)
    }
}

impl<R: Runnable> RunnableExt for R {}
