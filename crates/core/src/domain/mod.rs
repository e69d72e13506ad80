// Domain Layer - Queue roles and thread specs

pub mod error;
pub mod queue;

// Re-exports
pub use error::DomainError;
pub use queue::{
    QueueConfigurationSpec, QueueConfigurationSpecBuilder, QueueRole, QueueThreadSpec, ThreadKind,
};
