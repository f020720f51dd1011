//! Run listeners
//!
//! Every component invocation inside a traced run produces a span: a `Start`
//! event when it begins and exactly one `End` or `Error` event when it
//! finishes. Listeners attached to a [`RunContext`](crate::RunContext)
//! receive these events synchronously, on whichever thread the component
//! runs on.
//!
//! # Example
//!
//! ```
//! use runnable::callbacks::{RunEvent, RunListener};
//! use runnable::{Lambda, RunContext, Runnable};
//! use std::sync::Arc;
//!
//! struct PrintStarts;
//!
//! impl RunListener for PrintStarts {
//!     fn on_event(&self, event: &RunEvent) {
//!         if let RunEvent::Start(info) = event {
//!             println!("started {}", info.name);
//!         }
//!     }
//! }
//!
//! let ctx = RunContext::new().with_listener(Arc::new(PrintStarts));
//! let double = Lambda::new(|x: i32| x * 2);
//! assert_eq!(double.invoke(4, &ctx).unwrap(), 8);
//! ```

pub mod collector;
pub mod events;
pub mod logging;

pub use collector::{SpanOutcome, TraceCollector, TraceSpan};
pub use events::{RunEvent, SpanInfo};
pub use logging::LoggingListener;

/// Receives span events from a run
///
/// This trait is object-safe and is stored as `Arc<dyn RunListener>`.
pub trait RunListener: Send + Sync {
    /// Called for every span start, end and error
    fn on_event(&self, event: &RunEvent);
}
