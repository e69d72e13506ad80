// Port Layer - Interfaces for external collaborators

pub mod engine; // Embedded JS engine handle
pub mod exception_handler;
pub mod message_queue;
pub mod queue_thread_factory; // Host's named-thread construction service

// Re-exports
pub use engine::JsEngineHandle;
pub use exception_handler::{LoggingExceptionHandler, QueueThreadExceptionHandler};
pub use message_queue::{MessageQueue, Work};
pub use queue_thread_factory::QueueThreadFactory;
