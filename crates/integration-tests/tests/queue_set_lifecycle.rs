//! QueueSet construction and teardown against real threads

use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use queuebridge_core::application::{EngineOwnership, MessageQueueExt, QueueSet, QueueSetOptions};
use queuebridge_core::domain::{QueueConfigurationSpec, QueueRole, QueueThreadSpec};
use queuebridge_core::port::{JsEngineHandle, LoggingExceptionHandler, MessageQueue};
use queuebridge_core::AppError;
use queuebridge_infra_thread::{ThreadQueueFactory, ThreadedJsEngine};

struct Bridge {
    engine: Arc<ThreadedJsEngine>,
    factory: ThreadQueueFactory,
}

impl Bridge {
    fn new(engine_name: &str) -> Self {
        Self {
            engine: Arc::new(ThreadedJsEngine::start_named(engine_name).unwrap()),
            factory: ThreadQueueFactory::new(),
        }
    }

    fn queues(&self, spec: &QueueConfigurationSpec, options: QueueSetOptions) -> QueueSet {
        QueueSet::create(
            self.engine.clone(),
            spec,
            Arc::new(LoggingExceptionHandler),
            &self.factory,
            options,
        )
        .unwrap()
    }
}

fn thread_name_of(queue: &Arc<dyn MessageQueue>) -> Option<String> {
    queue
        .call_on_queue(|| Ok::<_, AppError>(std::thread::current().name().map(String::from)))
        .get()
        .unwrap()
}

#[test]
fn test_default_set_shares_main_ui_for_ui_background() {
    let bridge = Bridge::new("default_set_engine");
    let queues = bridge.queues(&QueueConfigurationSpec::create_default(), QueueSetOptions::default());

    assert!(queues.ui_background_queue().is_none());
    assert!(queues.get(QueueRole::UiBackground).is_none());
    assert_eq!(thread_name_of(&queues.ui_queue()).as_deref(), Some("main_ui"));
    assert_eq!(
        thread_name_of(&queues.native_modules_queue()).as_deref(),
        Some("native_modules")
    );
    assert_eq!(
        thread_name_of(&queues.js_queue()).as_deref(),
        Some("default_set_engine")
    );

    queues.destroy().unwrap();
    bridge.engine.release();
}

#[test]
fn test_equal_specs_share_one_queue_and_context() {
    let bridge = Bridge::new("dedup_engine");
    let shared = QueueThreadSpec::new_background("shared_worker");
    let spec = QueueConfigurationSpec::builder()
        .native_modules(shared.clone())
        .js(QueueThreadSpec::new_background("js"))
        .ui_background(shared)
        .build()
        .unwrap();
    let queues = bridge.queues(&spec, QueueSetOptions::default());

    let native = queues.native_modules_queue();
    let ui_background = queues.ui_background_queue().unwrap();
    assert!(Arc::ptr_eq(&native, &ui_background));

    let probe = Arc::clone(&native);
    let shared_context = ui_background
        .call_on_queue(move || Ok::<_, AppError>(probe.is_on_thread()))
        .get()
        .unwrap();
    assert!(shared_context);

    queues.destroy().unwrap();
    assert!(native.is_finished());
    bridge.engine.release();
}

#[test]
fn test_main_ui_spec_roles_share_the_ui_queue() {
    let bridge = Bridge::new("main_ui_roles_engine");
    let spec = QueueConfigurationSpec::builder()
        .native_modules(QueueThreadSpec::main_ui())
        .js(QueueThreadSpec::new_background("js"))
        .ui_background(QueueThreadSpec::main_ui())
        .build()
        .unwrap();
    let queues = bridge.queues(&spec, QueueSetOptions::default());

    let ui = queues.ui_queue();
    assert!(Arc::ptr_eq(&ui, &queues.native_modules_queue()));
    assert!(Arc::ptr_eq(&ui, &queues.ui_background_queue().unwrap()));

    // Roles bound to the main UI queue are not quit by destroy
    queues.destroy().unwrap();
    assert!(!ui.is_finished());
    assert_eq!(thread_name_of(&ui).as_deref(), Some("main_ui"));
    bridge.engine.release();
}

#[test]
fn test_destroy_is_idempotent_and_stops_owned_queues_only() {
    let bridge = Bridge::new("destroy_engine");
    let queues = bridge.queues(
        &QueueConfigurationSpec::create_with_separate_ui_background_thread(),
        QueueSetOptions::default(),
    );
    let native = queues.native_modules_queue();
    let ui_background = queues.ui_background_queue().unwrap();

    queues.destroy().unwrap();
    queues.destroy().unwrap();
    assert!(queues.is_destroyed());
    assert!(native.is_finished());
    assert!(ui_background.is_finished());

    let (tx, rx) = mpsc::channel();
    let late = tx.clone();
    native.run_on_queue_fn(move || late.send("native").unwrap());
    assert_eq!(native.dropped_count(), 1);

    let ui_tx = tx.clone();
    queues.ui_queue().run_on_queue_fn(move || ui_tx.send("ui").unwrap());
    queues.js_queue().run_on_queue_fn(move || tx.send("js").unwrap());

    let mut ran: Vec<_> = (0..2)
        .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap())
        .collect();
    ran.sort();
    assert_eq!(ran, vec!["js", "ui"]);
    assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());

    bridge.engine.release();
}

#[test]
fn test_adapter_ownership_quits_js_on_destroy() {
    let bridge = Bridge::new("adapter_engine");
    let queues = bridge.queues(
        &QueueConfigurationSpec::create_default(),
        QueueSetOptions {
            js_ownership: EngineOwnership::Adapter,
        },
    );
    let js = queues.js_queue();
    assert_eq!(js.call_on_queue(|| Ok::<_, AppError>(1)).get().unwrap(), 1);

    queues.destroy().unwrap();
    assert!(js.is_finished());
    assert!(bridge.engine.is_released());

    js.run_on_queue_fn(|| {});
    assert_eq!(js.dropped_count(), 1);
}

#[test]
fn test_two_bridges_share_the_process_main_ui_queue() {
    let bridge = Bridge::new("first_bridge_engine");
    let first = bridge.queues(&QueueConfigurationSpec::create_default(), QueueSetOptions::default());
    let second = bridge.queues(
        &QueueConfigurationSpec::create_with_separate_ui_background_thread(),
        QueueSetOptions::default(),
    );

    assert!(Arc::ptr_eq(&first.ui_queue(), &second.ui_queue()));
    assert!(!Arc::ptr_eq(
        &first.native_modules_queue(),
        &second.native_modules_queue()
    ));

    first.destroy().unwrap();
    assert!(!second.native_modules_queue().is_finished());
    assert_eq!(
        thread_name_of(&second.native_modules_queue()).as_deref(),
        Some("native_modules")
    );

    second.destroy().unwrap();
    bridge.engine.release();
}
