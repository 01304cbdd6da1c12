//! Registry configuration.

use serde::{Deserialize, Serialize};

/// Settings applied to a registry at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Emit the per-batch "Fired hook" debug line. Failures are always logged.
    #[serde(default = "default_true")]
    pub log_batches: bool,
    /// Component label attached by a `TracingLogger` built from this config.
    #[serde(default = "default_component")]
    pub component: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            log_batches: default_true(),
            component: default_component(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_component() -> String {
    "hooks".to_string()
}
