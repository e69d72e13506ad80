// Thread adapter constants (No magic values)

/// Name of the thread running the engine's task queue
pub const ENGINE_THREAD_NAME: &str = "js_engine";
