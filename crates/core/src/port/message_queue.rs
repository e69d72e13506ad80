// Message Queue Port
// Uniform contract over one execution context: submit work, check membership, quiesce

use crate::error::{AppError, Result};
use crate::port::QueueThreadExceptionHandler;
use std::sync::Arc;

/// Fire-and-forget unit of work
pub type Work = Box<dyn FnOnce() + Send + 'static>;

/// A queue bound to one execution context.
///
/// Implementations:
/// - NamedThreadQueue: dedicated OS thread (infra-thread)
/// - JsEngineQueue: forwards to the embedded engine's own task queue
pub trait MessageQueue: Send + Sync {
    /// Human-readable name used in diagnostics
    fn name(&self) -> &str;

    /// Enqueue work behind everything already submitted to this queue.
    ///
    /// Work submitted after `quit_synchronous` is dropped with a warning;
    /// the caller never sees an error.
    fn run_on_queue(&self, work: Work);

    /// True when the caller is already running inside this queue's context
    fn is_on_thread(&self) -> bool;

    /// Stop accepting work and release the context. Idempotent.
    ///
    /// When called from another context, blocks until pending work drains
    /// (for implementations that own their thread).
    fn quit_synchronous(&self) -> Result<()>;

    fn is_finished(&self) -> bool;

    /// Number of submissions dropped because the queue had finished
    fn dropped_count(&self) -> u64;

    /// Handler receiving failures raised by work on this queue
    fn exception_handler(&self) -> Arc<dyn QueueThreadExceptionHandler>;

    /// Fails with `AppError::Assertion` unless called from this queue's context
    fn assert_is_on_thread(&self, message: Option<&str>) -> Result<()> {
        if self.is_on_thread() {
            return Ok(());
        }
        let mut text = format!("Expected to be called from the '{}' thread!", self.name());
        if let Some(detail) = message {
            text.push(' ');
            text.push_str(detail);
        }
        Err(AppError::Assertion {
            queue: self.name().to_string(),
            message: text,
        })
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::port::exception_handler::LoggingExceptionHandler;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::sync::Mutex;
    use std::thread::{self, ThreadId};

    /// Runs work inline on the submitting thread
    pub struct InlineQueue {
        name: String,
        finished: AtomicBool,
        dropped: AtomicU64,
        executed: AtomicU64,
        quit_calls: AtomicU64,
        running_on: Mutex<Option<ThreadId>>,
        handler: Arc<dyn QueueThreadExceptionHandler>,
    }
    impl InlineQueue {
        pub fn new(name: impl Into<String>) -> Self {
            Self::with_handler(name, Arc::new(LoggingExceptionHandler))
        }
        pub fn with_handler(
            name: impl Into<String>,
            handler: Arc<dyn QueueThreadExceptionHandler>,
        ) -> Self {
            Self {
                name: name.into(),
                finished: AtomicBool::new(false),
                dropped: AtomicU64::new(0),
                executed: AtomicU64::new(0),
                quit_calls: AtomicU64::new(0),
                running_on: Mutex::new(None),
                handler,
            }
        }
        pub fn executed_count(&self) -> u64 {
            self.executed.load(Ordering::SeqCst)
        }
        pub fn quit_calls(&self) -> u64 {
            self.quit_calls.load(Ordering::SeqCst)
        }
    }
    impl MessageQueue for InlineQueue {
        fn name(&self) -> &str {
            &self.name
        }
        fn run_on_queue(&self, work: Work) {
            if self.finished.load(Ordering::SeqCst) {
                self.dropped.fetch_add(1, Ordering::SeqCst);
                return;
            }
            *self.running_on.lock().unwrap() = Some(thread::current().id());
            work();
            *self.running_on.lock().unwrap() = None;
            self.executed.fetch_add(1, Ordering::SeqCst);
        }
        fn is_on_thread(&self) -> bool {
            *self.running_on.lock().unwrap() == Some(thread::current().id())
        }
        fn quit_synchronous(&self) -> Result<()> {
            self.quit_calls.fetch_add(1, Ordering::SeqCst);
            self.finished.store(true, Ordering::SeqCst);
            Ok(())
        }
        fn is_finished(&self) -> bool {
            self.finished.load(Ordering::SeqCst)
        }
        fn dropped_count(&self) -> u64 {
            self.dropped.load(Ordering::SeqCst)
        }
        fn exception_handler(&self) -> Arc<dyn QueueThreadExceptionHandler> {
            Arc::clone(&self.handler)
        }
    }
}
