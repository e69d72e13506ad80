// Thread queue factory
// Background specs get a fresh thread; the main UI spec resolves to one shared queue

use crate::named_thread::NamedThreadQueue;
use queuebridge_core::domain::QueueThreadSpec;
use queuebridge_core::port::{MessageQueue, QueueThreadExceptionHandler, QueueThreadFactory};
use queuebridge_core::Result;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Creates NamedThreadQueues.
///
/// The main UI context is process-wide: the first `create` for the main UI
/// spec starts it (with that caller's exception handler), later calls share it.
#[derive(Default)]
pub struct ThreadQueueFactory {
    main_ui: Mutex<Option<Arc<NamedThreadQueue>>>,
}

impl ThreadQueueFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// The main UI queue, if any caller resolved it yet
    pub fn main_ui_queue(&self) -> Option<Arc<NamedThreadQueue>> {
        self.main_ui
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl QueueThreadFactory for ThreadQueueFactory {
    fn create(
        &self,
        spec: &QueueThreadSpec,
        exception_handler: Arc<dyn QueueThreadExceptionHandler>,
    ) -> Result<Arc<dyn MessageQueue>> {
        if !spec.is_main_ui() {
            return Ok(Arc::new(NamedThreadQueue::start(spec, exception_handler)?));
        }

        let mut main_ui = self.main_ui.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(queue) = main_ui.as_ref() {
            debug!("Reusing main UI queue");
            return Ok(Arc::clone(queue) as Arc<dyn MessageQueue>);
        }
        let queue = Arc::new(NamedThreadQueue::start(spec, exception_handler)?);
        *main_ui = Some(Arc::clone(&queue));
        Ok(queue)
    }
}
