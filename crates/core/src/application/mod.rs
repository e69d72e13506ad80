// Application Layer - Queue adapters and lifecycle

pub mod call;
pub mod future;
pub mod js_queue;
pub mod panic_guard;
pub mod queue_set;

// Re-exports
pub use call::MessageQueueExt;
pub use future::SettableFuture;
pub use js_queue::{EngineOwnership, JsEngineQueue};
pub use panic_guard::{execute_guarded, guard_work, PanicGuardResult};
pub use queue_set::{QueueSet, QueueSetOptions};
