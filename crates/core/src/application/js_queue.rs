// JS-engine-backed MessageQueue
// No thread loop of its own: work is forwarded to the engine's async task queue

use super::panic_guard::guard_work;
use crate::domain::QueueThreadSpec;
use crate::error::Result;
use crate::port::{JsEngineHandle, MessageQueue, QueueThreadExceptionHandler, Work};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Who tears down the engine's execution context on quit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineOwnership {
    /// The engine manages its own lifetime; quitting only stops accepting work
    #[default]
    Engine,
    /// Quitting the queue also releases the engine context
    Adapter,
}

pub struct JsEngineQueue {
    name: String,
    engine: Arc<dyn JsEngineHandle>,
    exception_handler: Arc<dyn QueueThreadExceptionHandler>,
    ownership: EngineOwnership,
    finished: AtomicBool,
    dropped: AtomicU64,
}

impl JsEngineQueue {
    pub fn create(
        engine: Arc<dyn JsEngineHandle>,
        spec: &QueueThreadSpec,
        exception_handler: Arc<dyn QueueThreadExceptionHandler>,
        ownership: EngineOwnership,
    ) -> Self {
        Self {
            name: spec.name().to_string(),
            engine,
            exception_handler,
            ownership,
            finished: AtomicBool::new(false),
            dropped: AtomicU64::new(0),
        }
    }

    pub fn ownership(&self) -> EngineOwnership {
        self.ownership
    }
}

impl MessageQueue for JsEngineQueue {
    fn name(&self) -> &str {
        &self.name
    }

    fn run_on_queue(&self, work: Work) {
        if self.finished.load(Ordering::Acquire) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            warn!(
                queue = %self.name,
                "Tried to enqueue work on already finished queue, dropping work"
            );
            return;
        }
        let work = guard_work(&self.name, Arc::clone(&self.exception_handler), work);
        self.engine.schedule_async(work);
    }

    fn is_on_thread(&self) -> bool {
        self.engine.is_on_engine_thread()
    }

    fn quit_synchronous(&self) -> Result<()> {
        if self.finished.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        info!(queue = %self.name, ownership = ?self.ownership, "JS queue finished");

        match self.ownership {
            EngineOwnership::Engine => {
                debug!(queue = %self.name, "Engine owns its context, leaving it running");
            }
            EngineOwnership::Adapter => self.engine.release(),
        }
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn exception_handler(&self) -> Arc<dyn QueueThreadExceptionHandler> {
        Arc::clone(&self.exception_handler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::MessageQueueExt;
    use crate::error::{AppError, WorkError};
    use crate::port::engine::mocks::ManualEngine;
    use crate::port::exception_handler::mocks::RecordingExceptionHandler;
    use std::sync::Mutex;

    fn setup(
        ownership: EngineOwnership,
    ) -> (Arc<ManualEngine>, Arc<RecordingExceptionHandler>, Arc<JsEngineQueue>) {
        let engine = Arc::new(ManualEngine::new());
        let handler = Arc::new(RecordingExceptionHandler::new());
        let queue = Arc::new(JsEngineQueue::create(
            engine.clone(),
            &QueueThreadSpec::new_background("js"),
            handler.clone(),
            ownership,
        ));
        (engine, handler, queue)
    }

    #[test]
    fn test_work_forwarded_to_engine_in_order() {
        let (engine, _, queue) = setup(EngineOwnership::Engine);
        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..5 {
            let order = Arc::clone(&order);
            queue.run_on_queue_fn(move || order.lock().unwrap().push(i));
        }
        assert_eq!(engine.pending_count(), 5);
        assert!(order.lock().unwrap().is_empty(), "work must run out-of-line");

        assert_eq!(engine.run_pending(), 5);
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_is_on_thread_delegates_to_engine() {
        let (engine, _, queue) = setup(EngineOwnership::Engine);
        assert!(!queue.is_on_thread());
        assert!(queue.assert_is_on_thread(None).is_err());

        let inside = Arc::new(Mutex::new(None));
        let (q, seen) = (Arc::clone(&queue), Arc::clone(&inside));
        queue.run_on_queue_fn(move || {
            *seen.lock().unwrap() = Some(q.assert_is_on_thread(Some("inside work")).is_ok());
        });
        engine.run_pending();
        assert_eq!(*inside.lock().unwrap(), Some(true));
    }

    #[test]
    fn test_assertion_error_names_queue() {
        let (_, _, queue) = setup(EngineOwnership::Engine);
        match queue.assert_is_on_thread(Some("during bundle load")) {
            Err(AppError::Assertion { queue, message }) => {
                assert_eq!(queue, "js");
                assert_eq!(
                    message,
                    "Expected to be called from the 'js' thread! during bundle load"
                );
            }
            other => panic!("expected assertion error, got {other:?}"),
        }
    }

    #[test]
    fn test_finished_queue_drops_work() {
        let (engine, handler, queue) = setup(EngineOwnership::Engine);
        queue.quit_synchronous().unwrap();
        assert!(queue.is_finished());

        queue.run_on_queue_fn(|| panic!("must never run"));
        queue.run_on_queue_fn(|| panic!("must never run"));

        assert_eq!(engine.pending_count(), 0);
        assert_eq!(queue.dropped_count(), 2);
        assert_eq!(handler.count(), 0);
    }

    #[test]
    fn test_quit_is_idempotent_and_leaves_engine_when_engine_owned() {
        let (engine, _, queue) = setup(EngineOwnership::Engine);
        queue.quit_synchronous().unwrap();
        queue.quit_synchronous().unwrap();
        assert_eq!(engine.release_calls(), 0);
    }

    #[test]
    fn test_adapter_ownership_releases_engine_once() {
        let (engine, _, queue) = setup(EngineOwnership::Adapter);
        queue.quit_synchronous().unwrap();
        queue.quit_synchronous().unwrap();
        assert_eq!(engine.release_calls(), 1);
    }

    #[test]
    fn test_fire_and_forget_panic_reaches_handler() {
        let (engine, handler, queue) = setup(EngineOwnership::Engine);
        queue.run_on_queue_fn(|| panic!("undefined is not a function"));
        queue.run_on_queue_fn(|| {});
        assert_eq!(engine.run_pending(), 2);

        let seen = handler.exceptions();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "js");
        assert!(seen[0].1.contains("undefined is not a function"));
    }

    #[test]
    fn test_call_on_queue_through_engine() {
        let (engine, _, queue) = setup(EngineOwnership::Engine);
        let q = Arc::clone(&queue);
        let future = queue.call_on_queue(move || Ok::<_, AppError>(q.is_on_thread()));
        assert!(!future.is_done());
        engine.run_pending();
        assert!(future.get().unwrap());
    }

    #[test]
    fn test_double_set_reported_to_handler_and_first_result_kept() {
        let (engine, handler, queue) = setup(EngineOwnership::Engine);
        let future = queue.call_on_queue(|| Ok::<_, AppError>(2u8));

        // A second producer wins the race before the engine runs the work
        future.set(1).unwrap();
        engine.run_pending();

        assert_eq!(future.get().unwrap(), 1);
        let seen = handler.exceptions();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].1.contains("already been set"));
    }

    #[test]
    fn test_call_on_finished_queue_resolves_with_internal_error() {
        let (_, _, queue) = setup(EngineOwnership::Engine);
        queue.quit_synchronous().unwrap();
        let future = queue.call_on_queue(|| Ok::<_, AppError>(()));
        assert!(matches!(future.get(), Err(WorkError::Internal(_))));
    }
}
