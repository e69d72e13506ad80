// Named-thread MessageQueue
// One OS thread per queue, draining an unbounded channel in submission order

use queuebridge_core::application::guard_work;
use queuebridge_core::application::panic_guard::panic_message;
use queuebridge_core::domain::QueueThreadSpec;
use queuebridge_core::port::{MessageQueue, QueueThreadExceptionHandler, Work};
use queuebridge_core::{AppError, Result};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle, ThreadId};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

enum Command {
    Run(Work),
    Quit,
}

/// Queue backed by a dedicated, named OS thread
pub struct NamedThreadQueue {
    spec: QueueThreadSpec,
    sender: UnboundedSender<Command>,
    thread_id: ThreadId,
    join: Mutex<Option<JoinHandle<()>>>,
    finished: AtomicBool,
    dropped: Arc<AtomicU64>,
    exception_handler: Arc<dyn QueueThreadExceptionHandler>,
}

impl NamedThreadQueue {
    /// Spawn the queue thread described by `spec`
    ///
    /// # Errors
    /// - AppError::Domain if `spec` fails validation
    /// - AppError::Spawn if the OS refuses the thread
    pub fn start(
        spec: &QueueThreadSpec,
        exception_handler: Arc<dyn QueueThreadExceptionHandler>,
    ) -> Result<Self> {
        spec.validate()?;

        let (sender, receiver) = mpsc::unbounded_channel();
        let dropped = Arc::new(AtomicU64::new(0));

        let mut builder = thread::Builder::new().name(spec.name().to_string());
        if let Some(size) = spec.stack_size() {
            builder = builder.stack_size(size);
        }

        let loop_name = spec.name().to_string();
        let loop_dropped = Arc::clone(&dropped);
        let handle = builder
            .spawn(move || run_loop(&loop_name, receiver, &loop_dropped))
            .map_err(|source| AppError::Spawn {
                name: spec.name().to_string(),
                source,
            })?;

        info!(
            queue = %spec.name(),
            kind = ?spec.kind(),
            stack_size = ?spec.stack_size(),
            "Queue thread started"
        );

        Ok(Self {
            spec: spec.clone(),
            sender,
            thread_id: handle.thread().id(),
            join: Mutex::new(Some(handle)),
            finished: AtomicBool::new(false),
            dropped,
            exception_handler,
        })
    }

    pub fn spec(&self) -> &QueueThreadSpec {
        &self.spec
    }

    pub fn is_main_ui(&self) -> bool {
        self.spec.is_main_ui()
    }

    // Every dropped submission bumps the counter and warns exactly once
    fn drop_work(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
        warn!(
            queue = %self.spec.name(),
            "Tried to enqueue work on already finished queue, dropping work"
        );
    }
}

fn run_loop(name: &str, mut receiver: UnboundedReceiver<Command>, dropped: &AtomicU64) {
    debug!(queue = %name, "Queue loop running");
    while let Some(command) = receiver.blocking_recv() {
        match command {
            Command::Run(work) => work(),
            Command::Quit => break,
        }
    }

    // Anything that raced past the finished check lands behind Quit
    receiver.close();
    while let Ok(command) = receiver.try_recv() {
        if let Command::Run(_) = command {
            dropped.fetch_add(1, Ordering::Relaxed);
            warn!(queue = %name, "Dropping work submitted after quit");
        }
    }
    info!(queue = %name, "Queue loop stopped");
}

impl MessageQueue for NamedThreadQueue {
    fn name(&self) -> &str {
        self.spec.name()
    }

    fn run_on_queue(&self, work: Work) {
        if self.finished.load(Ordering::Acquire) {
            self.drop_work();
            return;
        }
        let work = guard_work(self.spec.name(), Arc::clone(&self.exception_handler), work);
        if self.sender.send(Command::Run(work)).is_err() {
            // Loop already gone
            self.drop_work();
        }
    }

    fn is_on_thread(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    fn quit_synchronous(&self) -> Result<()> {
        if self.spec.is_main_ui() {
            return Err(AppError::InvalidState(
                "cannot quit the main UI queue".to_string(),
            ));
        }

        if !self.finished.swap(true, Ordering::AcqRel) {
            info!(queue = %self.spec.name(), "Quitting queue thread");
            // Queued behind pending work, so the loop drains first
            let _ = self.sender.send(Command::Quit);
        }

        if self.is_on_thread() {
            return Ok(());
        }

        // Held across join so concurrent quitters also wait for termination
        let mut join = self.join.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = join.take() {
            handle.join().map_err(|payload| {
                AppError::Internal(format!(
                    "queue thread '{}' panicked: {}",
                    self.spec.name(),
                    panic_message(payload.as_ref())
                ))
            })?;
            debug!(queue = %self.spec.name(), "Queue thread joined");
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

impl Drop for NamedThreadQueue {
    /// Stops the loop after pending work without joining
    fn drop(&mut self) {
        if !self.finished.swap(true, Ordering::AcqRel) {
            let _ = self.sender.send(Command::Quit);
            debug!(queue = %self.spec.name(), "Queue dropped, loop told to quit");
        }
    }
}
