//! Execution machinery shared by all components

pub mod erased;
pub mod pool;
pub(crate) mod span;

pub use erased::{ErasedRunnable, Payload, Stage};
pub use pool::{run_blocking, stream_detached, WorkerPool};
