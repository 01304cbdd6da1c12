//! The logger capability consumed by the registries, plus its stock sinks.
//!
//! A registry never talks to `tracing` on behalf of the caller directly; it
//! holds an optional [`HookLogger`] and calls exactly two methods on it.
//! Both take an optional structured payload and a message. `None` is the
//! plain-message form.

use std::sync::Mutex;

use serde_json::Value;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::logging::LoggingConfig;
use crate::config::registry::RegistryConfig;
use crate::error::CoreError;
use crate::result::CoreResult;

/// Logging sink injected into a registry.
pub trait HookLogger: Send + Sync {
    /// Records a debug line.
    fn debug(&self, fields: Option<&Value>, message: &str);

    /// Records an error line.
    fn error(&self, fields: Option<&Value>, message: &str);
}

/// Forwards hook log lines to the global `tracing` dispatcher.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    component: String,
}

impl TracingLogger {
    /// Creates a logger tagging every event with `component`.
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
        }
    }

    /// Creates a logger labelled from registry configuration.
    pub fn from_config(config: &RegistryConfig) -> Self {
        Self::new(config.component.clone())
    }

    /// Returns the component label.
    pub fn component(&self) -> &str {
        &self.component
    }
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self::from_config(&RegistryConfig::default())
    }
}

impl HookLogger for TracingLogger {
    fn debug(&self, fields: Option<&Value>, message: &str) {
        match fields {
            Some(fields) => {
                tracing::debug!(component = %self.component, fields = %fields, "{}", message)
            }
            None => tracing::debug!(component = %self.component, "{}", message),
        }
    }

    fn error(&self, fields: Option<&Value>, message: &str) {
        match fields {
            Some(fields) => {
                tracing::error!(component = %self.component, fields = %fields, "{}", message)
            }
            None => tracing::error!(component = %self.component, "{}", message),
        }
    }
}

/// Severity of a recorded entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogLevel {
    /// Written through [`HookLogger::debug`].
    Debug,
    /// Written through [`HookLogger::error`].
    Error,
}

/// One line captured by a [`MemoryLogger`].
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    /// Which method produced the entry.
    pub level: LogLevel,
    /// Structured payload, if any.
    pub fields: Option<Value>,
    /// The message text.
    pub message: String,
}

/// Keeps every line in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryLogger {
    /// Creates an empty logger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all recorded entries.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().clone()
    }

    /// Returns the messages recorded at `level`.
    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|entry| entry.level == level)
            .map(|entry| entry.message.clone())
            .collect()
    }

    /// Returns `true` if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drops all recorded entries.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn record(&self, level: LogLevel, fields: Option<&Value>, message: &str) {
        self.lock().push(LogEntry {
            level,
            fields: fields.cloned(),
            message: message.to_string(),
        });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<LogEntry>> {
        // Entries are pushed whole; a poisoned lock still holds valid data.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl HookLogger for MemoryLogger {
    fn debug(&self, fields: Option<&Value>, message: &str) {
        self.record(LogLevel::Debug, fields, message);
    }

    fn error(&self, fields: Option<&Value>, message: &str) {
        self.record(LogLevel::Error, fields, message);
    }
}

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Fails if a global
/// subscriber is already set.
pub fn init_tracing(config: &LoggingConfig) -> CoreResult<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let result = match config.format.as_str() {
        "json" => fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .try_init(),
        _ => fmt()
            .pretty()
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
    };

    result.map_err(|e| CoreError::logging(format!("Failed to install subscriber: {e}")))
}
