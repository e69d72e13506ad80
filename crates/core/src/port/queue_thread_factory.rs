// Queue Thread Factory Port
// Host service that turns a thread spec into a running MessageQueue

use crate::domain::QueueThreadSpec;
use crate::error::Result;
use crate::port::{MessageQueue, QueueThreadExceptionHandler};
use std::sync::Arc;

/// Named-thread queue construction service
///
/// Implementations:
/// - ThreadQueueFactory: OS threads, shared main UI queue (infra-thread)
#[cfg_attr(test, mockall::automock)]
pub trait QueueThreadFactory: Send + Sync {
    /// Create (or resolve, for the main UI spec) the queue backing `spec`
    ///
    /// # Errors
    /// - AppError::Domain if `spec` fails validation
    /// - AppError::Spawn if the thread cannot be started
    fn create(
        &self,
        spec: &QueueThreadSpec,
        exception_handler: Arc<dyn QueueThreadExceptionHandler>,
    ) -> Result<Arc<dyn MessageQueue>>;
}
