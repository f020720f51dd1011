//! Core domain models
//!
//! This module defines the component contract, the execution context that
//! travels with every call, run configuration and the crate's error type.

pub mod chunk;
pub mod config;
pub mod context;
pub mod error;
pub mod runnable;

pub use chunk::Accumulate;
pub use config::RunConfig;
pub use context::{RunContext, DEFAULT_RECURSION_LIMIT};
pub use error::{Error, Result};
pub use runnable::{BoxRunnable, ComponentKind, Dispatch, RunStream, Runnable, TypeInfo};
