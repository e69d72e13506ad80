//! Threaded stand-in for an embedded JS engine's async task queue.
//!
//! The engine owns one named OS thread running a tokio current-thread
//! runtime. `schedule_async` pushes onto an unbounded channel that the
//! runtime drains in order, yielding between tasks so timers and other
//! futures on the engine thread get polled.

use crate::constants::ENGINE_THREAD_NAME;
use queuebridge_core::application::panic_guard::panic_message;
use queuebridge_core::port::{JsEngineHandle, Work};
use queuebridge_core::{AppError, Result};
use std::sync::{Mutex, PoisonError};
use std::thread::{self, JoinHandle, ThreadId};
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, error, info, warn};

pub struct ThreadedJsEngine {
    name: String,
    sender: Mutex<Option<UnboundedSender<Work>>>,
    thread_id: ThreadId,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl ThreadedJsEngine {
    pub fn start() -> Result<Self> {
        Self::start_named(ENGINE_THREAD_NAME)
    }

    pub fn start_named(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let spawn_error = |source| AppError::Spawn {
            name: name.clone(),
            source,
        };

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(spawn_error)?;

        let (sender, mut receiver) = mpsc::unbounded_channel::<Work>();
        let loop_name = name.clone();
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                runtime.block_on(async move {
                    while let Some(work) = receiver.recv().await {
                        work();
                        tokio::task::yield_now().await;
                    }
                });
                info!(engine = %loop_name, "Engine task loop stopped");
            })
            .map_err(spawn_error)?;

        info!(engine = %name, "Engine thread started");
        Ok(Self {
            thread_id: handle.thread().id(),
            name,
            sender: Mutex::new(Some(sender)),
            join: Mutex::new(Some(handle)),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_released(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

impl JsEngineHandle for ThreadedJsEngine {
    fn schedule_async(&self, work: Work) {
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        match sender.as_ref() {
            Some(tx) => {
                if tx.send(work).is_err() {
                    warn!(engine = %self.name, "Engine task loop gone, dropping work");
                }
            }
            None => warn!(engine = %self.name, "Engine released, dropping work"),
        }
    }

    fn is_on_engine_thread(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    /// Close the task queue; pending tasks still run. Joins the engine thread
    /// unless called from it. Idempotent.
    fn release(&self) {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if sender.is_none() {
            return;
        }
        drop(sender);
        info!(engine = %self.name, "Releasing engine");

        if self.is_on_engine_thread() {
            return;
        }
        let handle = self.join.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(handle) = handle {
            match handle.join() {
                Ok(()) => debug!(engine = %self.name, "Engine thread joined"),
                Err(payload) => error!(
                    engine = %self.name,
                    panic_msg = %panic_message(payload.as_ref()),
                    "Engine thread panicked"
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc as std_mpsc;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_tasks_run_in_order_on_engine_thread() {
        let engine = Arc::new(ThreadedJsEngine::start().unwrap());
        let (tx, rx) = std_mpsc::channel();
        for i in 0..20 {
            let tx = tx.clone();
            let e = Arc::clone(&engine);
            engine.schedule_async(Box::new(move || {
                tx.send((i, e.is_on_engine_thread(), thread::current().name().map(String::from)))
                    .unwrap();
            }));
        }
        for i in 0..20 {
            let (seen, on_engine, name) = rx.recv().unwrap();
            assert_eq!(seen, i);
            assert!(on_engine);
            assert_eq!(name.as_deref(), Some(ENGINE_THREAD_NAME));
        }
        assert!(!engine.is_on_engine_thread());
        engine.release();
    }

    #[test]
    fn test_release_drains_then_drops_later_work() {
        let engine = ThreadedJsEngine::start_named("engine_release").unwrap();
        let (tx, rx) = std_mpsc::channel();
        for i in 0..5 {
            let tx = tx.clone();
            engine.schedule_async(Box::new(move || tx.send(i).unwrap()));
        }
        engine.release();
        assert!(engine.is_released());
        assert_eq!(rx.try_iter().count(), 5);

        engine.schedule_async(Box::new(move || tx.send(99).unwrap()));
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
        engine.release();
    }
}
