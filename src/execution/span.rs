//! Span lifecycle helpers

use crate::callbacks::{RunEvent, RunListener, SpanInfo};
use crate::core::{
    context::RunContext,
    error::{Error, Result},
    runnable::RunStream,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::trace;
use uuid::Uuid;

/// An open span. Emits exactly one terminal event: on `finish`, or with an
/// error when dropped unfinished.
pub(crate) struct ActiveSpan {
    listeners: Vec<Arc<dyn RunListener>>,
    run_id: Uuid,
    name: String,
    closed: bool,
}

impl ActiveSpan {
    pub(crate) fn open(ctx: &RunContext, name: &str) -> Self {
        let run_id = ctx.run_id().unwrap_or_else(Uuid::new_v4);
        trace!("Opening span {} ({})", name, run_id);

        let span = Self {
            listeners: ctx.listeners().to_vec(),
            run_id,
            name: name.to_string(),
            closed: false,
        };
        if !span.listeners.is_empty() {
            span.emit(RunEvent::Start(SpanInfo {
                run_id,
                parent_run_id: ctx.parent_run_id(),
                name: span.name.clone(),
                label: ctx.label().map(str::to_string),
                tags: ctx.tags().iter().cloned().collect(),
                metadata: ctx.metadata().clone(),
                started_at: Utc::now(),
            }));
        }
        span
    }

    pub(crate) fn finish<T>(self, result: &Result<T>) {
        match result {
            Ok(_) => self.succeed(),
            Err(e) => self.fail(e),
        }
    }

    pub(crate) fn succeed(mut self) {
        self.close(None);
    }

    pub(crate) fn fail(mut self, error: &Error) {
        self.close(Some(error.to_string()));
    }

    fn close(&mut self, error: Option<String>) {
        if self.closed {
            return;
        }
        self.closed = true;
        if self.listeners.is_empty() {
            return;
        }
        let event = match error {
            None => RunEvent::End {
                run_id: self.run_id,
                name: self.name.clone(),
                ended_at: Utc::now(),
            },
            Some(error) => RunEvent::Error {
                run_id: self.run_id,
                name: self.name.clone(),
                error,
                ended_at: Utc::now(),
            },
        };
        self.emit(event);
    }

    fn emit(&self, event: RunEvent) {
        for listener in &self.listeners {
            listener.on_event(&event);
        }
    }
}

impl Drop for ActiveSpan {
    fn drop(&mut self) {
        if !self.closed {
            self.close(Some("dropped before completion".to_string()));
        }
    }
}

type MakeStream<'a, T> = Box<dyn FnOnce(RunContext) -> RunStream<'a, T> + Send + 'a>;

enum StreamState<'a, T> {
    Pending {
        ctx: RunContext,
        name: Option<String>,
        make: MakeStream<'a, T>,
    },
    Running {
        inner: RunStream<'a, T>,
        span: Option<ActiveSpan>,
    },
    Done,
}

/// A stream whose span opens on the first pull and closes when the inner
/// stream ends or yields an error. The first error ends the stream.
pub(crate) struct SpanStream<'a, T> {
    state: StreamState<'a, T>,
}

impl<'a, T> SpanStream<'a, T> {
    /// `name` is `None` when the span is already open further up
    pub(crate) fn new(
        ctx: RunContext,
        name: Option<String>,
        make: impl FnOnce(RunContext) -> RunStream<'a, T> + Send + 'a,
    ) -> Self {
        Self {
            state: StreamState::Pending {
                ctx,
                name,
                make: Box::new(make),
            },
        }
    }
}

impl<'a, T> Iterator for SpanStream<'a, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match std::mem::replace(&mut self.state, StreamState::Done) {
                StreamState::Pending { ctx, name, make } => {
                    let span = name.map(|name| ActiveSpan::open(&ctx, &name));
                    let inner = make(ctx);
                    self.state = StreamState::Running { inner, span };
                }
                StreamState::Running { mut inner, span } => {
                    return match inner.next() {
                        Some(Ok(item)) => {
                            self.state = StreamState::Running { inner, span };
                            Some(Ok(item))
                        }
                        Some(Err(e)) => {
                            if let Some(span) = span {
                                span.fail(&e);
                            }
                            Some(Err(e))
                        }
                        None => {
                            if let Some(span) = span {
                                span.succeed();
                            }
                            None
                        }
                    };
                }
                StreamState::Done => return None,
            }
        }
    }
}
