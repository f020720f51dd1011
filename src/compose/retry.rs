//! Retrying failed invocations

use crate::core::{
    context::RunContext,
    error::{Error, Result},
    runnable::{ComponentKind, Runnable, TypeInfo},
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Re-invokes the inner component until it succeeds or the attempts run out.
/// Each attempt gets its own child span labeled `retry:attempt:N`; the error
/// of the last attempt is returned.
pub struct Retry<R> {
    inner: Arc<R>,
    max_attempts: usize,
    delay: Duration,
    retry_if: Option<Arc<dyn Fn(&Error) -> bool + Send + Sync>>,
}

impl<R: Runnable> Retry<R> {
    /// `max_attempts` counts the first attempt; zero is treated as one
    pub fn new(inner: R, max_attempts: usize) -> Self {
        Self {
            inner: Arc::new(inner),
            max_attempts: max_attempts.max(1),
            delay: Duration::ZERO,
            retry_if: None,
        }
    }

    /// Wait this long between attempts
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Only retry errors for which `predicate` holds
    pub fn retry_if<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&Error) -> bool + Send + Sync + 'static,
    {
        self.retry_if = Some(Arc::new(predicate));
        self
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    fn should_retry(&self, attempt: usize, error: &Error) -> bool {
        attempt < self.max_attempts
            && self.retry_if.as_ref().map_or(true, |retry_if| retry_if(error))
    }
}

fn attempt_label(attempt: usize) -> String {
    format!("retry:attempt:{}", attempt)
}

#[async_trait]
impl<R> Runnable for Retry<R>
where
    R: Runnable,
    R::Input: Clone,
{
    type Input = R::Input;
    type Output = R::Output;

    fn invoke(&self, input: R::Input, ctx: &RunContext) -> Result<R::Output> {
        ctx.scope(&self.name(), |ctx| {
            let inner_name = self.inner.name();
            let mut attempt = 1;
            loop {
                let result = ctx.child_scope(attempt_label(attempt), &inner_name, |ctx| {
                    self.inner.invoke(input.clone(), ctx)
                });
                match result {
                    Err(e) if self.should_retry(attempt, &e) => {
                        warn!(
                            "{} failed on attempt {}/{}: {}",
                            inner_name, attempt, self.max_attempts, e
                        );
                        if !self.delay.is_zero() {
                            std::thread::sleep(self.delay);
                        }
                        attempt += 1;
                    }
                    other => {
                        debug!("{} finished after {} attempt(s)", inner_name, attempt);
                        return other;
                    }
                }
            }
        })
    }

    fn name(&self) -> String {
        "Retry".to_string()
    }

    fn input_type(&self) -> TypeInfo {
        self.inner.input_type()
    }

    fn output_type(&self) -> TypeInfo {
        self.inner.output_type()
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Retry
    }

    async fn ainvoke(self: Arc<Self>, input: R::Input, ctx: RunContext) -> Result<R::Output> {
        let name = self.name();
        let this = self.clone();
        ctx.scope_async(&name, move |ctx| async move {
            let inner_name = this.inner.name();
            let mut attempt = 1;
            loop {
                let inner = this.inner.clone();
                let attempt_input = input.clone();
                let result = ctx
                    .child_scope_async(attempt_label(attempt), &inner_name, move |ctx| {
                        inner.ainvoke(attempt_input, ctx)
                    })
                    .await;
                match result {
                    Err(e) if this.should_retry(attempt, &e) => {
                        warn!(
                            "{} failed on attempt {}/{}: {}",
                            inner_name, attempt, this.max_attempts, e
                        );
                        if !this.delay.is_zero() {
                            tokio::time::sleep(this.delay).await;
                        }
                        attempt += 1;
                    }
                    other => return other,
                }
            }
        })
        .await
    }
}
