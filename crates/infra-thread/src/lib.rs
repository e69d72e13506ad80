// QueueBridge Infrastructure - Thread Adapters
// Implements: MessageQueue, QueueThreadFactory, JsEngineHandle

pub mod constants;
pub mod engine;
pub mod factory;
pub mod named_thread;

pub use engine::ThreadedJsEngine;
pub use factory::ThreadQueueFactory;
pub use named_thread::NamedThreadQueue;
