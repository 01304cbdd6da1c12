//! Configuration schemas.
//!
//! Settings are deserialized from an optional TOML file merged with
//! `HOOKREG__`-prefixed environment variables via the `config` crate. Every
//! field has a default, so an empty source yields a usable configuration.

pub mod logging;
pub mod registry;

use serde::{Deserialize, Serialize};

use self::logging::LoggingConfig;
use self::registry::RegistryConfig;

use crate::error::CoreError;
use crate::result::CoreResult;

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HooksConfig {
    /// Registry behavior.
    #[serde(default)]
    pub registry: RegistryConfig,
    /// Subscriber settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl HooksConfig {
    /// Load configuration from an optional TOML file and the environment.
    ///
    /// A missing file is skipped. Environment variables use the `HOOKREG`
    /// prefix with `__` separating sections, e.g.
    /// `HOOKREG__REGISTRY__LOG_BATCHES=false`.
    pub fn load(path: Option<&str>) -> CoreResult<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder
                .add_source(config::File::new(path, config::FileFormat::Toml).required(false));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("HOOKREG")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| CoreError::configuration(format!("Failed to build config: {e}")))?;

        config.try_deserialize().map_err(CoreError::from)
    }
}
