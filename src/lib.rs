//! runnable - composable, typed pipeline stages
//!
//! Build pipelines out of small components, chain them with
//! [`RunnableExt::then`], fan them out with [`Parallel`], and run the result
//! with `invoke`, `ainvoke`, `batch` or `stream`.
//!
//! ```
//! use runnable::{Lambda, Parallel, RunContext, Runnable, RunnableExt};
//!
//! let chain = Lambda::new(|s: String| s.to_uppercase()).then(Lambda::new(|s: String| s.len()));
//! assert_eq!(chain.invoke("abc".to_string(), &RunContext::new()).unwrap(), 3);
//!
//! let fan_out = Parallel::builder()
//!     .branch("a", Lambda::new(|x: i32| x * 2))
//!     .branch("b", Lambda::new(|x: i32| x * x))
//!     .build()
//!     .unwrap();
//! let outputs = fan_out.invoke(3, &RunContext::new()).unwrap();
//! assert_eq!(outputs["a"], 6);
//! assert_eq!(outputs["b"], 9);
//! ```

pub mod callbacks;
pub mod cli;
pub mod compose;
pub mod core;
pub mod execution;

// Re-export commonly used types
pub use callbacks::{LoggingListener, RunEvent, RunListener, TraceCollector, TraceSpan};
pub use compose::{
    lambda, Branch, Each, Fallbacks, Lambda, Parallel, Passthrough, Retry, Route, RunnableExt,
    Sequence,
};
pub use core::{
    Accumulate, BoxRunnable, ComponentKind, Error, Result, RunConfig, RunContext, RunStream,
    Runnable, TypeInfo,
};
