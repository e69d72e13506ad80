// Central Error Types for the Application

use thiserror::Error;

/// Boxed error raised by user-supplied work
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    /// Wrong-context access. Programmer bug, not recoverable.
    #[error("Assertion failed on queue '{queue}': {message}")]
    Assertion { queue: String, message: String },

    #[error("Result has already been set")]
    ResultAlreadySet,

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Failed to spawn thread '{name}': {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure raised inside a submitted work item
#[derive(Error, Debug)]
pub enum WorkError {
    #[error("Work failed: {0}")]
    Failed(BoxError),

    #[error("Work panicked: {0}")]
    Panicked(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl WorkError {
    /// Borrow the original error raised by the callable, if it was of type `E`
    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            WorkError::Failed(err) => err.downcast_ref::<E>(),
            _ => None,
        }
    }

    pub fn is_panic(&self) -> bool {
        matches!(self, WorkError::Panicked(_))
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
