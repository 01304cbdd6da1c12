//! Error types for configuration loading and logging setup.
//!
//! The registries never wrap action failures; these errors only cover the
//! ambient setup done around them.

use thiserror::Error;

/// Errors raised while loading configuration or installing a subscriber.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Configuration could not be built or deserialized.
    #[error("configuration error: {message}")]
    Configuration {
        /// A human-readable error message.
        message: String,
        /// Underlying cause.
        #[source]
        source: Option<config::ConfigError>,
    },
    /// The global tracing subscriber could not be installed.
    #[error("logging error: {0}")]
    Logging(String),
}

impl CoreError {
    /// Create a configuration error without an underlying cause.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Create a logging setup error.
    pub fn logging(message: impl Into<String>) -> Self {
        Self::Logging(message.into())
    }
}

impl From<config::ConfigError> for CoreError {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration {
            message: err.to_string(),
            source: Some(err),
        }
    }
}
