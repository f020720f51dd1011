//! Listener that forwards span events to `tracing`

use super::{RunEvent, RunListener};
use tracing::{debug, info, warn};

/// Logs span starts and ends
///
/// Root spans are logged at `info`, nested spans at `debug`. Failures are
/// always logged at `warn`.
#[derive(Debug, Clone, Default)]
pub struct LoggingListener;

impl LoggingListener {
    pub fn new() -> Self {
        Self
    }
}

impl RunListener for LoggingListener {
    fn on_event(&self, event: &RunEvent) {
        match event {
            RunEvent::Start(info) => match (&info.parent_run_id, &info.label) {
                (None, _) => info!("Starting run: {} ({})", info.name, info.run_id),
                (Some(parent), Some(label)) => debug!(
                    "Starting {} [{}] ({}, parent {})",
                    info.name, label, info.run_id, parent
                ),
                (Some(parent), None) => {
                    debug!("Starting {} ({}, parent {})", info.name, info.run_id, parent)
                }
            },
            RunEvent::End { run_id, name, .. } => {
                debug!("Finished {} ({})", name, run_id);
            }
            RunEvent::Error {
                run_id,
                name,
                error,
                ..
            } => {
                warn!("{} failed ({}): {}", name, run_id, error);
            }
        }
    }
}
