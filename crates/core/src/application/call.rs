// Call-with-result on any MessageQueue

use super::future::{AbandonGuard, SettableFuture};
use super::panic_guard::{execute_guarded, PanicGuardResult};
use crate::error::{BoxError, WorkError};
use crate::port::MessageQueue;
use std::panic::AssertUnwindSafe;
use tracing::error;

/// Generic helpers layered on the object-safe `MessageQueue` port
pub trait MessageQueueExt: MessageQueue {
    /// Submit a closure without boxing it at the call site
    fn run_on_queue_fn<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.run_on_queue(Box::new(f));
    }

    /// Run `callable` on the queue and return a handle to its result.
    ///
    /// An `Err(e)` from the callable surfaces as `WorkError::Failed(e)`
    /// (recover `e` with `WorkError::downcast_ref`), a panic as
    /// `WorkError::Panicked`. If the work is dropped without running the
    /// handle resolves to `WorkError::Internal`.
    fn call_on_queue<T, E, F>(&self, callable: F) -> SettableFuture<T>
    where
        T: Send + 'static,
        E: Into<BoxError>,
        F: FnOnce() -> Result<T, E> + Send + 'static,
    {
        let future = SettableFuture::new();
        let guard = AbandonGuard::new(future.clone());
        let queue = self.name().to_string();
        let handler = self.exception_handler();

        self.run_on_queue(Box::new(move || {
            let slot = guard.future();
            let recorded = match execute_guarded(AssertUnwindSafe(callable)) {
                PanicGuardResult::Success(Ok(value)) => slot.set(value),
                PanicGuardResult::Success(Err(e)) => slot.set_error(WorkError::Failed(e.into())),
                PanicGuardResult::Panicked(msg) => slot.set_error(WorkError::Panicked(msg)),
            };
            if let Err(e) = recorded {
                error!(queue = %queue, error = %e, "Failed to record queue call result");
                handler.handle_exception(&queue, &WorkError::Internal(e.to_string()));
            }
        }));

        future
    }
}

impl<Q: MessageQueue + ?Sized> MessageQueueExt for Q {}
