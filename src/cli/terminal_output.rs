//! Live span output for the terminal
//!
//! [`TerminalListener`] prints a line when a span starts and another when it
//! finishes, indented by nesting depth, so the shape of a run is visible
//! while it executes.
//!
//! # Example
//!
//! ```no_run
//! use runnable::cli::terminal_output::TerminalListener;
//! use runnable::{Lambda, RunContext, Runnable};
//! use std::sync::Arc;
//!
//! let ctx = RunContext::new().with_listener(Arc::new(TerminalListener::new()));
//! Lambda::new(|x: i32| x + 1).invoke(1, &ctx).unwrap();
//! ```

use crate::callbacks::{RunEvent, RunListener};
use crate::cli::output::{CHECK, CROSS, ROCKET};
use console::style;
use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

/// Listener that prints span events as they happen
///
/// Branches of a parallel run print interleaved; every line carries the
/// span name so the output stays readable.
#[derive(Debug)]
pub struct TerminalListener {
    depths: Mutex<HashMap<Uuid, usize>>,
    show_labels: bool,
}

impl TerminalListener {
    pub fn new() -> Self {
        Self {
            depths: Mutex::new(HashMap::new()),
            show_labels: true,
        }
    }

    /// Hide the `[seq:step:N]` style position labels
    pub fn without_labels(mut self) -> Self {
        self.show_labels = false;
        self
    }

    /// Record a span's depth and return it
    fn enter(&self, run_id: Uuid, parent: Option<Uuid>) -> usize {
        let mut depths = self.depths.lock().unwrap_or_else(PoisonError::into_inner);
        let depth = parent
            .and_then(|parent| depths.get(&parent).map(|depth| depth + 1))
            .unwrap_or(0);
        depths.insert(run_id, depth);
        depth
    }

    fn leave(&self, run_id: Uuid) -> usize {
        self.depths
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&run_id)
            .unwrap_or(0)
    }

    fn print_line(&self, line: String) {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        let _ = writeln!(handle, "{}", line);
        let _ = handle.flush();
    }
}

impl Default for TerminalListener {
    fn default() -> Self {
        Self::new()
    }
}

impl RunListener for TerminalListener {
    fn on_event(&self, event: &RunEvent) {
        match event {
            RunEvent::Start(info) => {
                let depth = self.enter(info.run_id, info.parent_run_id);
                let label = match (&info.label, self.show_labels) {
                    (Some(label), true) => format!(" {}", style(format!("[{}]", label)).dim()),
                    _ => String::new(),
                };
                self.print_line(format!(
                    "{}{}{}{}",
                    "  ".repeat(depth),
                    ROCKET,
                    style(&info.name).cyan(),
                    label
                ));
            }
            RunEvent::End { run_id, name, .. } => {
                let depth = self.leave(*run_id);
                self.print_line(format!("{}{}{}", "  ".repeat(depth), CHECK, style(name).dim()));
            }
            RunEvent::Error {
                run_id,
                name,
                error,
                ..
            } => {
                let depth = self.leave(*run_id);
                self.print_line(format!(
                    "{}{}{} {}",
                    "  ".repeat(depth),
                    CROSS,
                    style(name).red(),
                    style(error).dim()
                ));
            }
        }
    }
}
