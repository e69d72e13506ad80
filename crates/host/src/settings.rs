//! Host settings
//!
//! Sources, later ones win:
//! - `queuebridge.toml` in the working directory (optional)
//! - `QUEUEBRIDGE_*` environment variables, e.g. `QUEUEBRIDGE_LOG_FORMAT=json`

use queuebridge_core::application::{EngineOwnership, QueueSetOptions};
use queuebridge_core::domain::queue::DEFAULT_UI_BACKGROUND_THREAD_NAME;
use queuebridge_core::domain::{DomainError, QueueConfigurationSpec, QueueThreadSpec};
use serde::Deserialize;
use std::path::PathBuf;

const CONFIG_FILE: &str = "queuebridge";
const ENV_PREFIX: &str = "QUEUEBRIDGE";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub log_format: LogFormat,
    /// Also write daily-rolling log files here
    pub log_dir: Option<PathBuf>,
    /// Start a separate UI-background queue
    pub ui_background: bool,
    pub native_modules_stack_size: Option<usize>,
    pub js_ownership: EngineOwnership,
}

impl HostConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name(CONFIG_FILE).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn queue_spec(&self) -> Result<QueueConfigurationSpec, DomainError> {
        let defaults = QueueConfigurationSpec::create_default();

        let native_modules = match self.native_modules_stack_size {
            Some(size) => {
                QueueThreadSpec::new_background_with_stack(defaults.native_modules().name(), size)
            }
            None => defaults.native_modules().clone(),
        };

        let mut builder = QueueConfigurationSpec::builder()
            .native_modules(native_modules)
            .js(defaults.js().clone());
        if self.ui_background {
            builder = builder
                .ui_background(QueueThreadSpec::new_background(DEFAULT_UI_BACKGROUND_THREAD_NAME));
        }
        builder.build()
    }

    pub fn queue_set_options(&self) -> QueueSetOptions {
        QueueSetOptions {
            js_ownership: self.js_ownership,
        }
    }
}
