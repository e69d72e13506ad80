//! QueueBridge Host - Main Entry Point
//! Runs one bridge lifecycle: create the queue set, start up, destroy

mod bridge;
mod logging;
mod settings;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use queuebridge_core::application::{EngineOwnership, QueueSet};
use queuebridge_core::port::{JsEngineHandle, LoggingExceptionHandler};
use queuebridge_infra_thread::{ThreadQueueFactory, ThreadedJsEngine};
use settings::HostConfig;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> Result<()> {
    // 1. Load configuration
    let config = HostConfig::load().context("Failed to load configuration")?;

    // 2. Initialize logging
    let _log_guard = logging::init(&config);
    info!("QueueBridge host v{} starting...", VERSION);

    // 3. Setup dependencies (DI wiring)
    let engine = Arc::new(ThreadedJsEngine::start()?);
    let factory = ThreadQueueFactory::new();
    let spec = config.queue_spec()?;

    // 4. Create the queue set (once per bridge instance)
    let queues = QueueSet::create(
        engine.clone(),
        &spec,
        Arc::new(LoggingExceptionHandler),
        &factory,
        config.queue_set_options(),
    )?;

    // 5. Bridge startup
    let startup = bridge::run_startup(&queues);
    if let Ok(report) = &startup {
        info!(
            roles_checked = report.roles_checked,
            native_modules = report.native_modules,
            "Bridge ready"
        );
    }

    // 6. Shutdown (once per bridge instance), even after a failed startup
    queues.destroy()?;
    if config.js_ownership == EngineOwnership::Engine {
        // The engine tears itself down; in this harness the host plays the engine
        engine.release();
    }
    startup.context("Bridge startup failed")?;

    info!("Shutdown complete.");
    Ok(())
}
