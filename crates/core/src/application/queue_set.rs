//! Queue set - the four role queues of one bridge instance.
//!
//! Created once at bridge startup and destroyed once at shutdown. The UI
//! queue is never quit (the host owns its main loop). The JS queue is only
//! quit when the adapter owns the engine (`EngineOwnership::Adapter`).

use super::js_queue::{EngineOwnership, JsEngineQueue};
use crate::domain::{QueueConfigurationSpec, QueueRole, QueueThreadSpec};
use crate::error::{AppError, Result};
use crate::port::{JsEngineHandle, MessageQueue, QueueThreadExceptionHandler, QueueThreadFactory};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Queue set tunables
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSetOptions {
    #[serde(default)]
    pub js_ownership: EngineOwnership,
}

struct BoundQueue {
    spec: QueueThreadSpec,
    queue: Arc<dyn MessageQueue>,
}

pub struct QueueSet {
    ui: BoundQueue,
    ui_background: Option<BoundQueue>,
    native_modules: BoundQueue,
    js: Arc<JsEngineQueue>,
    options: QueueSetOptions,
    destroyed: AtomicBool,
}

impl QueueSet {
    /// Build one queue per role.
    ///
    /// Specs equal to one already resolved share its queue. The JS role is
    /// always backed by `engine`, whatever its spec matches.
    ///
    /// # Errors
    /// - AppError::Domain if `spec` fails validation
    /// - any error from `factory.create`; queues created so far are quit
    pub fn create(
        engine: Arc<dyn JsEngineHandle>,
        spec: &QueueConfigurationSpec,
        exception_handler: Arc<dyn QueueThreadExceptionHandler>,
        factory: &dyn QueueThreadFactory,
        options: QueueSetOptions,
    ) -> Result<Self> {
        spec.validate()?;

        let mut resolver = Resolver {
            factory,
            exception_handler: &exception_handler,
            specs_to_queues: HashMap::new(),
        };

        let built = resolver.build(spec);
        let (ui, native_modules, ui_background) = match built {
            Ok(queues) => queues,
            Err(e) => {
                error!(error = %e, "Queue set creation failed, quitting created queues");
                resolver.quit_created();
                return Err(e);
            }
        };

        let js = Arc::new(JsEngineQueue::create(
            engine,
            spec.js(),
            Arc::clone(&exception_handler),
            options.js_ownership,
        ));

        info!(
            native_modules = %native_modules.queue.name(),
            js = %js.name(),
            ui_background = ?ui_background.as_ref().map(|b| b.queue.name().to_string()),
            "Queue set created"
        );

        Ok(Self {
            ui,
            ui_background,
            native_modules,
            js,
            options,
            destroyed: AtomicBool::new(false),
        })
    }

    pub fn ui_queue(&self) -> Arc<dyn MessageQueue> {
        Arc::clone(&self.ui.queue)
    }

    pub fn ui_background_queue(&self) -> Option<Arc<dyn MessageQueue>> {
        self.ui_background.as_ref().map(|b| Arc::clone(&b.queue))
    }

    pub fn native_modules_queue(&self) -> Arc<dyn MessageQueue> {
        Arc::clone(&self.native_modules.queue)
    }

    pub fn js_queue(&self) -> Arc<dyn MessageQueue> {
        Arc::clone(&self.js) as Arc<dyn MessageQueue>
    }

    /// Queue for `role`; `None` only for an unconfigured UI-background queue
    pub fn get(&self, role: QueueRole) -> Option<Arc<dyn MessageQueue>> {
        match role {
            QueueRole::Ui => Some(self.ui_queue()),
            QueueRole::UiBackground => self.ui_background_queue(),
            QueueRole::NativeModules => Some(self.native_modules_queue()),
            QueueRole::Js => Some(self.js_queue()),
        }
    }

    pub fn options(&self) -> QueueSetOptions {
        self.options
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    /// Quit the queues this set owns. Safe to call more than once.
    ///
    /// Every quit is attempted; the first failure is returned.
    pub fn destroy(&self) -> Result<()> {
        if self.destroyed.swap(true, Ordering::AcqRel) {
            debug!("Queue set already destroyed");
            return Ok(());
        }
        info!("Destroying queue set");

        let mut first_err: Option<AppError> = None;
        let mut quit = |queue: &dyn MessageQueue| {
            if let Err(e) = queue.quit_synchronous() {
                error!(queue = %queue.name(), error = %e, "Failed to quit queue");
                first_err.get_or_insert(e);
            }
        };

        if let Some(bg) = &self.ui_background {
            if !bg.spec.is_main_ui() {
                quit(bg.queue.as_ref());
            }
        }
        if !self.native_modules.spec.is_main_ui() {
            quit(self.native_modules.queue.as_ref());
        }
        if self.options.js_ownership == EngineOwnership::Adapter {
            quit(self.js.as_ref());
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

struct Resolver<'a> {
    factory: &'a dyn QueueThreadFactory,
    exception_handler: &'a Arc<dyn QueueThreadExceptionHandler>,
    specs_to_queues: HashMap<QueueThreadSpec, Arc<dyn MessageQueue>>,
}

impl Resolver<'_> {
    fn build(
        &mut self,
        spec: &QueueConfigurationSpec,
    ) -> Result<(BoundQueue, BoundQueue, Option<BoundQueue>)> {
        let ui = self.resolve(&QueueThreadSpec::main_ui())?;
        let native_modules = self.resolve(spec.native_modules())?;
        let ui_background = spec
            .ui_background()
            .map(|bg| self.resolve(bg))
            .transpose()?;
        Ok((ui, native_modules, ui_background))
    }

    fn resolve(&mut self, spec: &QueueThreadSpec) -> Result<BoundQueue> {
        if let Some(queue) = self.specs_to_queues.get(spec) {
            debug!(queue = %queue.name(), "Reusing queue for matching spec");
            return Ok(BoundQueue {
                spec: spec.clone(),
                queue: Arc::clone(queue),
            });
        }

        let queue = self
            .factory
            .create(spec, Arc::clone(self.exception_handler))?;
        self.specs_to_queues.insert(spec.clone(), Arc::clone(&queue));
        Ok(BoundQueue {
            spec: spec.clone(),
            queue,
        })
    }

    fn quit_created(&self) {
        for (spec, queue) in &self.specs_to_queues {
            if spec.is_main_ui() {
                continue;
            }
            if let Err(e) = queue.quit_synchronous() {
                error!(queue = %queue.name(), error = %e, "Failed to quit queue");
            }
        }
    }
}
