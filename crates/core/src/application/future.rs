//! Single-assignment result slot shared between a queue and the caller.
//!
//! The producer side (`set` / `set_error`) is called once by the work item;
//! the consumer side can block (`get`, `get_timeout`), poll (`is_done`) or
//! `.await` the handle.

use crate::error::{AppError, Result, WorkError};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, Waker};
use std::time::Duration;

enum SlotState<T> {
    Pending,
    Ready(std::result::Result<T, WorkError>),
    Taken,
}

struct Slot<T> {
    state: SlotState<T>,
    // One per awaiting clone
    wakers: Vec<Waker>,
}

struct Shared<T> {
    slot: Mutex<Slot<T>>,
    ready: Condvar,
}

/// Handle over one result slot. Clones share the slot.
pub struct SettableFuture<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for SettableFuture<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Default for SettableFuture<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SettableFuture<T> {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                slot: Mutex::new(Slot {
                    state: SlotState::Pending,
                    wakers: Vec::new(),
                }),
                ready: Condvar::new(),
            }),
        }
    }

    /// Record the value. Fails if a result was already recorded.
    pub fn set(&self, value: T) -> Result<()> {
        self.complete(Ok(value))
    }

    /// Record a failure. Fails if a result was already recorded.
    pub fn set_error(&self, error: WorkError) -> Result<()> {
        self.complete(Err(error))
    }

    /// True once a result was recorded (taken or not)
    pub fn is_done(&self) -> bool {
        !matches!(self.lock().state, SlotState::Pending)
    }

    /// Block until the result is available and take it
    pub fn get(&self) -> std::result::Result<T, WorkError> {
        let slot = self.lock();
        let mut slot = self
            .shared
            .ready
            .wait_while(slot, |s| matches!(s.state, SlotState::Pending))
            .unwrap_or_else(PoisonError::into_inner);
        Self::take(&mut slot)
    }

    /// Like `get`, but gives up after `timeout`, returning `None`
    pub fn get_timeout(&self, timeout: Duration) -> Option<std::result::Result<T, WorkError>> {
        let slot = self.lock();
        let (mut slot, wait) = self
            .shared
            .ready
            .wait_timeout_while(slot, timeout, |s| matches!(s.state, SlotState::Pending))
            .unwrap_or_else(PoisonError::into_inner);
        if wait.timed_out() && matches!(slot.state, SlotState::Pending) {
            return None;
        }
        Some(Self::take(&mut slot))
    }

    fn complete(&self, result: std::result::Result<T, WorkError>) -> Result<()> {
        let wakers = {
            let mut slot = self.lock();
            if !matches!(slot.state, SlotState::Pending) {
                return Err(AppError::ResultAlreadySet);
            }
            slot.state = SlotState::Ready(result);
            std::mem::take(&mut slot.wakers)
        };
        self.shared.ready.notify_all();
        for waker in wakers {
            waker.wake();
        }
        Ok(())
    }

    fn take(slot: &mut Slot<T>) -> std::result::Result<T, WorkError> {
        match std::mem::replace(&mut slot.state, SlotState::Taken) {
            SlotState::Ready(result) => result,
            SlotState::Taken => Err(WorkError::Internal("result already taken".to_string())),
            // Callers only take after waiting for a non-pending state
            SlotState::Pending => {
                slot.state = SlotState::Pending;
                Err(WorkError::Internal("result not yet available".to_string()))
            }
        }
    }

    // Nothing panics while holding the lock, so a poisoned slot is still consistent
    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.shared.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Future for SettableFuture<T> {
    type Output = std::result::Result<T, WorkError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut slot = self.lock();
        if matches!(slot.state, SlotState::Pending) {
            let waker = cx.waker();
            if !slot.wakers.iter().any(|w| w.will_wake(waker)) {
                slot.wakers.push(waker.clone());
            }
            return Poll::Pending;
        }
        Poll::Ready(Self::take(&mut slot))
    }
}

/// Fails the slot if the work carrying it is dropped without running,
/// e.g. when it was submitted to a finished queue.
pub(crate) struct AbandonGuard<T> {
    future: SettableFuture<T>,
}

impl<T> AbandonGuard<T> {
    pub(crate) fn new(future: SettableFuture<T>) -> Self {
        Self { future }
    }

    pub(crate) fn future(&self) -> &SettableFuture<T> {
        &self.future
    }
}

impl<T> Drop for AbandonGuard<T> {
    fn drop(&mut self) {
        if !self.future.is_done() {
            let _ = self.future.set_error(WorkError::Internal(
                "work was dropped before it ran".to_string(),
            ));
        }
    }
}
