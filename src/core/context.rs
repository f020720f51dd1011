//! Run context - per-invocation record threaded through every component

use crate::callbacks::RunListener;
use crate::core::{
    config::RunConfig,
    error::Result,
    runnable::RunStream,
};
use crate::execution::span::{ActiveSpan, SpanStream};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use uuid::Uuid;

/// Default budget for dynamic re-dispatch and nesting depth
pub const DEFAULT_RECURSION_LIMIT: usize = 25;

/// Execution context for a single run
///
/// Carries listeners, tags, metadata and limits down the composition tree.
/// Contexts are values: composites derive a new context for every child with
/// [`RunContext::child`] and never hand a mutated parent to their children.
#[derive(Clone)]
pub struct RunContext {
    listeners: Vec<Arc<dyn RunListener>>,
    tags: BTreeSet<String>,
    metadata: BTreeMap<String, Value>,
    max_concurrency: Option<usize>,
    recursion_limit: usize,
    recursion_budget: usize,
    run_id: Option<Uuid>,
    parent_run_id: Option<Uuid>,
    run_name: Option<String>,
    label: Option<String>,
    in_span: bool,
}

impl RunContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
            tags: BTreeSet::new(),
            metadata: BTreeMap::new(),
            max_concurrency: None,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            recursion_budget: DEFAULT_RECURSION_LIMIT,
            run_id: None,
            parent_run_id: None,
            run_name: None,
            label: None,
            in_span: false,
        }
    }

    /// Build a context from a serializable run configuration
    pub fn from_config(config: &RunConfig) -> Self {
        Self::new().merged(config)
    }

    pub fn with_listener(mut self, listener: Arc<dyn RunListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = Some(max_concurrency);
        self
    }

    pub fn with_recursion_limit(mut self, recursion_limit: usize) -> Self {
        self.recursion_limit = recursion_limit;
        self.recursion_budget = recursion_limit;
        self
    }

    /// Name used for the root span instead of the component's own name
    pub fn with_run_name(mut self, run_name: impl Into<String>) -> Self {
        self.run_name = Some(run_name.into());
        self
    }

    /// Pin the id of the next top-level run
    pub fn with_run_id(mut self, run_id: Uuid) -> Self {
        self.run_id = Some(run_id);
        self
    }

    pub fn listeners(&self) -> &[Arc<dyn RunListener>] {
        &self.listeners
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn metadata(&self) -> &BTreeMap<String, Value> {
        &self.metadata
    }

    pub fn max_concurrency(&self) -> Option<usize> {
        self.max_concurrency
    }

    /// Remaining recursion budget
    pub fn recursion_limit(&self) -> usize {
        self.recursion_limit
    }

    /// Recursion limit the run was configured with. Unlike
    /// [`RunContext::recursion_limit`] it is not consumed by child contexts.
    pub fn recursion_budget(&self) -> usize {
        self.recursion_budget
    }

    /// Id of the current run. `None` until a top-level run has started,
    /// unless pinned with [`RunContext::with_run_id`].
    pub fn run_id(&self) -> Option<Uuid> {
        self.run_id
    }

    pub fn parent_run_id(&self) -> Option<Uuid> {
        self.parent_run_id
    }

    pub fn run_name(&self) -> Option<&str> {
        self.run_name.as_deref()
    }

    /// Position of this run inside its parent (e.g. `seq:step:2`)
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Whether tracing listeners are attached
    pub fn is_traced(&self) -> bool {
        !self.listeners.is_empty()
    }

    /// Merge a run configuration into a new context.
    ///
    /// Tags and metadata are added; limits and run name are overridden when set.
    pub fn merged(&self, config: &RunConfig) -> Self {
        let mut ctx = self.clone();
        ctx.tags.extend(config.tags.iter().cloned());
        ctx.metadata
            .extend(config.metadata.iter().map(|(k, v)| (k.clone(), v.clone())));
        if let Some(max_concurrency) = config.max_concurrency {
            ctx.max_concurrency = Some(max_concurrency);
        }
        if let Some(recursion_limit) = config.recursion_limit {
            ctx.recursion_limit = recursion_limit;
            ctx.recursion_budget = recursion_limit;
        }
        if let Some(run_name) = &config.run_name {
            ctx.run_name = Some(run_name.clone());
        }
        ctx
    }

    /// Derive the context for a child component.
    ///
    /// The child gets a fresh run id parented to this run, inherits tags,
    /// metadata, listeners and limits, and has one less unit of recursion
    /// budget. The caller is expected to open the child's span (see
    /// [`RunContext::child_scope`]).
    pub fn child(&self, label: impl Into<String>) -> RunContext {
        RunContext {
            listeners: self.listeners.clone(),
            tags: self.tags.clone(),
            metadata: self.metadata.clone(),
            max_concurrency: self.max_concurrency,
            recursion_limit: self.recursion_limit.saturating_sub(1),
            recursion_budget: self.recursion_budget,
            run_id: Some(Uuid::new_v4()),
            parent_run_id: self.run_id,
            run_name: None,
            label: Some(label.into()),
            in_span: true,
        }
    }

    /// Context for one element of a batch.
    ///
    /// Outside a run every element becomes its own top-level run, so a pinned
    /// run id is dropped.
    pub(crate) fn batch_item(&self) -> RunContext {
        let mut ctx = self.clone();
        if !ctx.in_span {
            ctx.run_id = None;
        }
        ctx
    }

    /// The context of a run that is starting at the top level
    fn entered(&self) -> RunContext {
        let mut ctx = self.clone();
        ctx.run_id = Some(self.run_id.unwrap_or_else(Uuid::new_v4));
        ctx.in_span = true;
        ctx
    }

    fn span_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.run_name.as_deref().unwrap_or(name)
    }

    /// Run `f` inside the span of the current component.
    ///
    /// When this component was started by a composite its span is already
    /// open and `f` runs directly; at the top level a root span is opened.
    pub fn scope<T>(&self, name: &str, f: impl FnOnce(&RunContext) -> Result<T>) -> Result<T> {
        if self.in_span {
            return f(self);
        }
        let ctx = self.entered();
        let span = ActiveSpan::open(&ctx, self.span_name(name));
        let result = f(&ctx);
        span.finish(&result);
        result
    }

    /// Run `f` for a child component inside a new child span
    pub fn child_scope<T>(
        &self,
        label: impl Into<String>,
        name: &str,
        f: impl FnOnce(&RunContext) -> Result<T>,
    ) -> Result<T> {
        let child = self.child(label);
        let span = ActiveSpan::open(&child, name);
        let result = f(&child);
        span.finish(&result);
        result
    }

    /// Async counterpart of [`RunContext::scope`]
    pub async fn scope_async<T, F, Fut>(&self, name: &str, f: F) -> Result<T>
    where
        F: FnOnce(RunContext) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if self.in_span {
            return f(self.clone()).await;
        }
        let ctx = self.entered();
        let span = ActiveSpan::open(&ctx, self.span_name(name));
        let result = f(ctx).await;
        span.finish(&result);
        result
    }

    /// Async counterpart of [`RunContext::child_scope`]
    pub async fn child_scope_async<T, F, Fut>(
        &self,
        label: impl Into<String>,
        name: &str,
        f: F,
    ) -> Result<T>
    where
        F: FnOnce(RunContext) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let child = self.child(label);
        let span = ActiveSpan::open(&child, name);
        let result = f(child).await;
        span.finish(&result);
        result
    }

    /// Wrap a lazily built stream in the current component's span.
    ///
    /// The span opens when the stream is first polled and closes when it is
    /// exhausted or yields an error.
    pub fn stream_scope<'a, T: 'a>(
        self,
        name: impl Into<String>,
        make: impl FnOnce(RunContext) -> RunStream<'a, T> + Send + 'a,
    ) -> RunStream<'a, T> {
        let name = name.into();
        if self.in_span {
            return Box::new(SpanStream::new(self, None, make));
        }
        let name = self.span_name(&name).to_string();
        let ctx = self.entered();
        Box::new(SpanStream::new(ctx, Some(name), make))
    }

    /// Wrap a lazily built child stream in a new child span
    pub fn child_stream_scope<'a, T: 'a>(
        &self,
        label: impl Into<String>,
        name: impl Into<String>,
        make: impl FnOnce(RunContext) -> RunStream<'a, T> + Send + 'a,
    ) -> RunStream<'a, T> {
        Box::new(SpanStream::new(self.child(label), Some(name.into()), make))
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunContext")
            .field("listeners", &self.listeners.len())
            .field("tags", &self.tags)
            .field("metadata", &self.metadata)
            .field("max_concurrency", &self.max_concurrency)
            .field("recursion_limit", &self.recursion_limit)
            .field("recursion_budget", &self.recursion_budget)
            .field("run_id", &self.run_id)
            .field("parent_run_id", &self.parent_run_id)
            .field("run_name", &self.run_name)
            .field("label", &self.label)
            .finish()
    }
}
