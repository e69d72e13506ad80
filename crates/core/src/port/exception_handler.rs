// Exception Handler Port
// Host policy for failures raised by fire-and-forget work

use crate::error::WorkError;
use tracing::error;

/// Receives every failure that escapes a submitted work item
pub trait QueueThreadExceptionHandler: Send + Sync {
    fn handle_exception(&self, queue: &str, error: &WorkError);
}

/// Default handler (production): reports through tracing
pub struct LoggingExceptionHandler;

impl QueueThreadExceptionHandler for LoggingExceptionHandler {
    fn handle_exception(&self, queue: &str, err: &WorkError) {
        error!(queue = %queue, error = %err, "Uncaught exception in queue work");
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Records every reported failure as (queue, message)
    #[derive(Default)]
    pub struct RecordingExceptionHandler {
        seen: Mutex<Vec<(String, String)>>,
    }
    impl RecordingExceptionHandler {
        pub fn new() -> Self {
            Self::default()
        }
        pub fn exceptions(&self) -> Vec<(String, String)> {
            self.seen.lock().unwrap().clone()
        }
        pub fn count(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }
    impl QueueThreadExceptionHandler for RecordingExceptionHandler {
        fn handle_exception(&self, queue: &str, error: &WorkError) {
            self.seen
                .lock()
                .unwrap()
                .push((queue.to_string(), error.to_string()));
        }
    }
}
