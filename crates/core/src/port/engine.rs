// Embedded JS Engine Port
// The engine owns its thread and its async task queue; we only submit to it

use crate::port::Work;

/// Handle to an embedded JavaScript engine context
pub trait JsEngineHandle: Send + Sync {
    /// Schedule work on the engine's own async task queue (FIFO)
    fn schedule_async(&self, work: Work);

    /// True when the caller runs on the engine's thread
    fn is_on_engine_thread(&self) -> bool;

    /// Tear down the engine's execution context.
    ///
    /// Only invoked when the queue adapter owns the engine
    /// (`EngineOwnership::Adapter`).
    fn release(&self);
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;
    use std::thread::{self, ThreadId};

    /// Engine whose task queue is drained manually by the test
    #[derive(Default)]
    pub struct ManualEngine {
        pending: Mutex<VecDeque<Work>>,
        engine_thread: Mutex<Option<ThreadId>>,
        release_calls: AtomicU64,
    }
    impl ManualEngine {
        pub fn new() -> Self {
            Self::default()
        }
        pub fn pending_count(&self) -> usize {
            self.pending.lock().unwrap().len()
        }
        pub fn release_calls(&self) -> u64 {
            self.release_calls.load(Ordering::SeqCst)
        }
        /// Run queued work on the calling thread, which acts as the engine thread
        /// for the duration. Returns how many items ran.
        pub fn run_pending(&self) -> usize {
            *self.engine_thread.lock().unwrap() = Some(thread::current().id());
            let mut ran = 0;
            loop {
                // Lock released before running, work may schedule more work
                let next = self.pending.lock().unwrap().pop_front();
                match next {
                    Some(work) => {
                        work();
                        ran += 1;
                    }
                    None => break,
                }
            }
            *self.engine_thread.lock().unwrap() = None;
            ran
        }
    }
    impl JsEngineHandle for ManualEngine {
        fn schedule_async(&self, work: Work) {
            self.pending.lock().unwrap().push_back(work);
        }
        fn is_on_engine_thread(&self) -> bool {
            *self.engine_thread.lock().unwrap() == Some(thread::current().id())
        }
        fn release(&self) {
            self.release_calls.fetch_add(1, Ordering::SeqCst);
        }
    }
}
