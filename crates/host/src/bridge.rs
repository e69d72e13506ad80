// Bridge startup sequence - exercises every queue the way a bridge instance does

use queuebridge_core::application::{MessageQueueExt, QueueSet};
use queuebridge_core::domain::QueueRole;
use queuebridge_core::{AppError, Result, WorkError};
use std::sync::Arc;
use tracing::info;

/// What the startup sequence observed
#[derive(Debug)]
pub struct StartupReport {
    pub native_modules: usize,
    pub roles_checked: usize,
}

/// Assert each queue's context from inside it, then route one JS call that
/// hops to the native-modules queue and back.
pub fn run_startup(queues: &QueueSet) -> Result<StartupReport> {
    let mut roles_checked = 0;
    for role in QueueRole::ALL {
        let Some(queue) = queues.get(role) else {
            continue;
        };
        let inner = Arc::clone(&queue);
        queue
            .call_on_queue(move || inner.assert_is_on_thread(Some("during startup")))
            .get()
            .map_err(work_error)?;
        info!(role = %role, queue = %queue.name(), "Queue context verified");
        roles_checked += 1;
    }

    let js = queues.js_queue();
    let native = queues.native_modules_queue();
    let js_inner = Arc::clone(&js);
    let native_modules = js
        .call_on_queue(move || {
            js_inner.assert_is_on_thread(None)?;
            // JS asks native modules for its registry
            let inner = Arc::clone(&native);
            native
                .call_on_queue(move || {
                    inner.assert_is_on_thread(None)?;
                    Ok::<_, AppError>(MODULE_NAMES.len())
                })
                .get()
                .map_err(work_error)
        })
        .get()
        .map_err(work_error)?;
    info!(native_modules, "Native module registry loaded from JS");

    Ok(StartupReport {
        native_modules,
        roles_checked,
    })
}

const MODULE_NAMES: [&str; 3] = ["DeviceInfo", "Networking", "Timing"];

fn work_error(e: WorkError) -> AppError {
    match e {
        WorkError::Failed(inner) => match inner.downcast::<AppError>() {
            Ok(app) => *app,
            Err(other) => AppError::Internal(other.to_string()),
        },
        other => AppError::Internal(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use queuebridge_core::application::QueueSetOptions;
    use queuebridge_core::domain::QueueConfigurationSpec;
    use queuebridge_core::port::{JsEngineHandle, LoggingExceptionHandler};
    use queuebridge_infra_thread::{ThreadQueueFactory, ThreadedJsEngine};

    #[test]
    fn test_startup_checks_every_configured_role() {
        let engine = Arc::new(ThreadedJsEngine::start_named("startup_engine").unwrap());
        let factory = ThreadQueueFactory::new();
        let queues = QueueSet::create(
            engine.clone(),
            &QueueConfigurationSpec::create_with_separate_ui_background_thread(),
            Arc::new(LoggingExceptionHandler),
            &factory,
            QueueSetOptions::default(),
        )
        .unwrap();

        let report = run_startup(&queues).unwrap();
        assert_eq!(report.roles_checked, 4);
        assert_eq!(report.native_modules, MODULE_NAMES.len());

        queues.destroy().unwrap();
        engine.release();
    }

    #[test]
    fn test_work_error_unwraps_app_error() {
        let err = work_error(WorkError::Failed(Box::new(AppError::ResultAlreadySet)));
        assert!(matches!(err, AppError::ResultAlreadySet));

        let err = work_error(WorkError::Panicked("boom".to_string()));
        assert!(matches!(err, AppError::Internal(m) if m.contains("boom")));
    }
}
