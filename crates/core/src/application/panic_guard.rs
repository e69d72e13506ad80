// Panic isolation for queue work
use crate::error::WorkError;
use crate::port::{QueueThreadExceptionHandler, Work};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::error;

/// Result of a panic-guarded execution
#[derive(Debug)]
pub enum PanicGuardResult<T> {
    /// Execution completed successfully
    Success(T),
    /// Execution panicked
    Panicked(String),
}

/// Execute a closure with panic isolation
///
/// If the closure panics, the panic is caught and returned as PanicGuardResult::Panicked.
/// This keeps a failing work item from killing the queue's thread.
///
/// # Example
/// ```text
/// let result = execute_guarded(|| {
///     // This panic will be caught
///     panic!("test panic");
/// });
///
/// match result {
///     PanicGuardResult::Panicked(msg) => {
///         println!("Caught panic: {}", msg);
///     }
///     _ => {}
/// }
/// ```
pub fn execute_guarded<F, T>(f: F) -> PanicGuardResult<T>
where
    F: FnOnce() -> T + std::panic::UnwindSafe,
{
    match catch_unwind(f) {
        Ok(result) => PanicGuardResult::Success(result),
        Err(panic_info) => {
            let panic_msg = panic_message(panic_info.as_ref());
            error!(panic_msg = %panic_msg, "Queue work panicked");
            PanicGuardResult::Panicked(panic_msg)
        }
    }
}

/// Extract the message of a panic payload
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Wrap fire-and-forget work so a panic reaches the queue's exception handler
pub fn guard_work(
    queue: &str,
    handler: Arc<dyn QueueThreadExceptionHandler>,
    work: Work,
) -> Work {
    let queue = queue.to_string();
    Box::new(move || {
        if let PanicGuardResult::Panicked(msg) = execute_guarded(AssertUnwindSafe(work)) {
            handler.handle_exception(&queue, &WorkError::Panicked(msg));
        }
    })
}
