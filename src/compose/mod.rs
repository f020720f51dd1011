//! Building blocks for composing components
//!
//! The two core primitives are [`Sequence`] (chain stages) and [`Parallel`]
//! (fan out). [`Lambda`] lifts plain functions into components, and the
//! remaining wrappers add routing, configuration and error recovery.

pub mod binding;
pub mod branch;
pub mod each;
pub mod ext;
pub mod fallbacks;
pub mod lambda;
pub mod parallel;
pub mod passthrough;
pub mod retry;
pub mod sequence;

pub use binding::Bound;
pub use branch::{Branch, BranchBuilder};
pub use each::Each;
pub use ext::RunnableExt;
pub use fallbacks::Fallbacks;
pub use lambda::{lambda, Lambda, Route};
pub use parallel::{Parallel, ParallelBuilder};
pub use passthrough::Passthrough;
pub use retry::Retry;
pub use sequence::Sequence;
