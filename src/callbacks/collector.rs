//! In-memory trace collection

use super::{RunEvent, RunListener};
use chrono::{DateTime, Duration, Utc};
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Final state of a span
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpanOutcome {
    Running,
    Success,
    Error(String),
}

/// One node of the execution tree
#[derive(Debug, Clone)]
pub struct TraceSpan {
    pub run_id: Uuid,
    pub parent_run_id: Option<Uuid>,
    pub name: String,
    pub label: Option<String>,
    pub tags: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub outcome: SpanOutcome,
}

impl TraceSpan {
    pub fn is_success(&self) -> bool {
        self.outcome == SpanOutcome::Success
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, SpanOutcome::Error(_))
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            SpanOutcome::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn duration(&self) -> Option<Duration> {
        self.ended_at.map(|end| end - self.started_at)
    }
}

/// Listener that records every event and rebuilds the span tree on demand
#[derive(Debug, Default)]
pub struct TraceCollector {
    events: Mutex<Vec<RunEvent>>,
}

impl TraceCollector {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<RunEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Raw events in arrival order
    pub fn events(&self) -> Vec<RunEvent> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Spans in start order
    pub fn spans(&self) -> Vec<TraceSpan> {
        let events = self.lock();
        let mut spans: Vec<TraceSpan> = Vec::new();
        for event in events.iter() {
            match event {
                RunEvent::Start(info) => spans.push(TraceSpan {
                    run_id: info.run_id,
                    parent_run_id: info.parent_run_id,
                    name: info.name.clone(),
                    label: info.label.clone(),
                    tags: info.tags.clone(),
                    started_at: info.started_at,
                    ended_at: None,
                    outcome: SpanOutcome::Running,
                }),
                RunEvent::End {
                    run_id, ended_at, ..
                } => {
                    if let Some(span) = spans.iter_mut().find(|s| s.run_id == *run_id) {
                        span.ended_at = Some(*ended_at);
                        span.outcome = SpanOutcome::Success;
                    }
                }
                RunEvent::Error {
                    run_id,
                    error,
                    ended_at,
                    ..
                } => {
                    if let Some(span) = spans.iter_mut().find(|s| s.run_id == *run_id) {
                        span.ended_at = Some(*ended_at);
                        span.outcome = SpanOutcome::Error(error.clone());
                    }
                }
            }
        }
        spans
    }

    /// First span with the given name
    pub fn find(&self, name: &str) -> Option<TraceSpan> {
        self.spans().into_iter().find(|span| span.name == name)
    }

    /// Spans without a parent
    pub fn roots(&self) -> Vec<TraceSpan> {
        self.spans()
            .into_iter()
            .filter(|span| span.parent_run_id.is_none())
            .collect()
    }

    /// Direct children of a span, in start order
    pub fn children_of(&self, run_id: Uuid) -> Vec<TraceSpan> {
        self.spans()
            .into_iter()
            .filter(|span| span.parent_run_id == Some(run_id))
            .collect()
    }
}

impl RunListener for TraceCollector {
    fn on_event(&self, event: &RunEvent) {
        self.lock().push(event.clone());
    }
}
