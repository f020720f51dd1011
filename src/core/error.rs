//! Error types for runnable construction and execution

use thiserror::Error;

/// Errors raised while building or running components
///
/// Composites never wrap the errors of their children: whatever a stage
/// returns is what the caller of the outermost component sees.
#[derive(Debug, Error)]
pub enum Error {
    /// The composition shape is invalid (raised at construction time)
    #[error("Invalid composition: {0}")]
    InvalidComposition(String),

    /// A component's input precondition was violated
    #[error("Invalid input for {component}: {reason}")]
    InvalidInput { component: String, reason: String },

    /// Error raised by a stage's own logic
    #[error(transparent)]
    Component(#[from] anyhow::Error),

    /// Dynamic re-dispatch exceeded the recursion budget
    #[error("Recursion limit of {limit} reached in {component}")]
    RecursionLimit { component: String, limit: usize },

    /// A type-erased stage received a value of the wrong type
    #[error("Type mismatch in {component}: expected {expected}, got {actual}")]
    TypeMismatch {
        component: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// An async-only component was invoked through the blocking path
    #[error("{0} only has an async implementation, use ainvoke")]
    AsyncOnly(String),

    /// Worker pool setup failed or a worker task panicked
    #[error("Worker error: {0}")]
    Worker(String),

    /// Invalid run configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Wrap any displayable failure as a component error
    pub fn component(message: impl std::fmt::Display) -> Self {
        Error::Component(anyhow::anyhow!("{}", message))
    }

    /// Build an input validation error
    pub fn invalid_input(component: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidInput {
            component: component.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
