//! Span events emitted during a run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Everything known about a span when it starts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanInfo {
    pub run_id: Uuid,
    pub parent_run_id: Option<Uuid>,
    /// Component name
    pub name: String,
    /// Position inside the parent, e.g. `seq:step:1` or `map:key:summary`
    pub label: Option<String>,
    pub tags: Vec<String>,
    pub metadata: BTreeMap<String, Value>,
    pub started_at: DateTime<Utc>,
}

/// Lifecycle event of one span
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    Start(SpanInfo),
    End {
        run_id: Uuid,
        name: String,
        ended_at: DateTime<Utc>,
    },
    Error {
        run_id: Uuid,
        name: String,
        error: String,
        ended_at: DateTime<Utc>,
    },
}

impl RunEvent {
    pub fn run_id(&self) -> Uuid {
        match self {
            RunEvent::Start(info) => info.run_id,
            RunEvent::End { run_id, .. } | RunEvent::Error { run_id, .. } => *run_id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            RunEvent::Start(info) => &info.name,
            RunEvent::End { name, .. } | RunEvent::Error { name, .. } => name,
        }
    }

    /// Whether this event closes a span
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunEvent::Start(_))
    }
}
