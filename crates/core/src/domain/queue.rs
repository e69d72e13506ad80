// Queue Domain Model

use super::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the host's main UI context
pub const MAIN_UI_THREAD_NAME: &str = "main_ui";

/// Smallest stack a background queue thread may request (64 KiB)
pub const MIN_STACK_SIZE: usize = 64 * 1024;

/// Longest accepted queue thread name
pub const MAX_THREAD_NAME_LEN: usize = 64;

pub const DEFAULT_NATIVE_MODULES_THREAD_NAME: &str = "native_modules";
pub const DEFAULT_JS_THREAD_NAME: &str = "js";
pub const DEFAULT_UI_BACKGROUND_THREAD_NAME: &str = "ui_background";

/// Execution-context role a queue plays for the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueRole {
    Ui,
    UiBackground,
    NativeModules,
    Js,
}

impl QueueRole {
    pub const ALL: [QueueRole; 4] = [
        QueueRole::Ui,
        QueueRole::UiBackground,
        QueueRole::NativeModules,
        QueueRole::Js,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueueRole::Ui => "ui",
            QueueRole::UiBackground => "ui_background",
            QueueRole::NativeModules => "native_modules",
            QueueRole::Js => "js",
        }
    }
}

impl fmt::Display for QueueRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of context a spec describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadKind {
    /// The host's main UI loop (never owned by us)
    MainUi,
    /// A dedicated thread spawned for the queue
    NewBackground,
}

/// Describes the named context backing a queue.
///
/// Equal specs name the same underlying context, so a queue set creates one
/// queue per distinct spec.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueueThreadSpec {
    kind: ThreadKind,
    name: String,
    #[serde(default)]
    stack_size: Option<usize>,
}

impl QueueThreadSpec {
    pub fn main_ui() -> Self {
        Self {
            kind: ThreadKind::MainUi,
            name: MAIN_UI_THREAD_NAME.to_string(),
            stack_size: None,
        }
    }

    pub fn new_background(name: impl Into<String>) -> Self {
        Self {
            kind: ThreadKind::NewBackground,
            name: name.into(),
            stack_size: None,
        }
    }

    pub fn new_background_with_stack(name: impl Into<String>, stack_size: usize) -> Self {
        Self {
            kind: ThreadKind::NewBackground,
            name: name.into(),
            stack_size: Some(stack_size),
        }
    }

    pub fn kind(&self) -> ThreadKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stack_size(&self) -> Option<usize> {
        self.stack_size
    }

    pub fn is_main_ui(&self) -> bool {
        self.kind == ThreadKind::MainUi
    }

    /// Validate name and stack size
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(DomainError::InvalidSpec(
                "thread name cannot be empty".to_string(),
            ));
        }

        if self.name.len() > MAX_THREAD_NAME_LEN {
            return Err(DomainError::InvalidSpec(format!(
                "thread name too long: {} bytes (max {})",
                self.name.len(),
                MAX_THREAD_NAME_LEN
            )));
        }

        if !self
            .name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
        {
            return Err(DomainError::InvalidSpec(format!(
                "thread name '{}' must be alphanumeric (plus '_', '-', '.')",
                self.name
            )));
        }

        if let Some(size) = self.stack_size {
            if size < MIN_STACK_SIZE {
                return Err(DomainError::InvalidSpec(format!(
                    "stack size {} for '{}' below minimum {}",
                    size, self.name, MIN_STACK_SIZE
                )));
            }
        }

        Ok(())
    }
}

/// Which contexts back each non-engine role, plus the JS queue's name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueConfigurationSpec {
    native_modules: QueueThreadSpec,
    js: QueueThreadSpec,
    #[serde(default)]
    ui_background: Option<QueueThreadSpec>,
}

impl QueueConfigurationSpec {
    pub fn builder() -> QueueConfigurationSpecBuilder {
        QueueConfigurationSpecBuilder::default()
    }

    pub fn create_default() -> Self {
        Self {
            native_modules: QueueThreadSpec::new_background(DEFAULT_NATIVE_MODULES_THREAD_NAME),
            js: QueueThreadSpec::new_background(DEFAULT_JS_THREAD_NAME),
            ui_background: None,
        }
    }

    pub fn create_with_separate_ui_background_thread() -> Self {
        Self {
            ui_background: Some(QueueThreadSpec::new_background(
                DEFAULT_UI_BACKGROUND_THREAD_NAME,
            )),
            ..Self::create_default()
        }
    }

    pub fn native_modules(&self) -> &QueueThreadSpec {
        &self.native_modules
    }

    pub fn js(&self) -> &QueueThreadSpec {
        &self.js
    }

    pub fn ui_background(&self) -> Option<&QueueThreadSpec> {
        self.ui_background.as_ref()
    }

    pub fn validate(&self) -> Result<()> {
        self.native_modules.validate()?;
        self.js.validate()?;
        if let Some(spec) = &self.ui_background {
            spec.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct QueueConfigurationSpecBuilder {
    native_modules: Option<QueueThreadSpec>,
    js: Option<QueueThreadSpec>,
    ui_background: Option<QueueThreadSpec>,
}

impl QueueConfigurationSpecBuilder {
    pub fn native_modules(mut self, spec: QueueThreadSpec) -> Self {
        self.native_modules = Some(spec);
        self
    }

    pub fn js(mut self, spec: QueueThreadSpec) -> Self {
        self.js = Some(spec);
        self
    }

    pub fn ui_background(mut self, spec: QueueThreadSpec) -> Self {
        self.ui_background = Some(spec);
        self
    }

    pub fn build(self) -> Result<QueueConfigurationSpec> {
        let spec = QueueConfigurationSpec {
            native_modules: self
                .native_modules
                .ok_or(DomainError::MissingSpec("native_modules"))?,
            js: self.js.ok_or(DomainError::MissingSpec("js"))?,
            ui_background: self.ui_background,
        };
        spec.validate()?;
        Ok(spec)
    }
}
