//! Installs the process-global subscriber, so it lives in its own binary.

use hookreg_core::config::logging::LoggingConfig;
use hookreg_core::logging::HookLogger;
use hookreg_core::{CoreError, TracingLogger, init_tracing};

#[test]
fn init_tracing_once_per_process() {
    let config = LoggingConfig {
        level: "debug".to_string(),
        format: "json".to_string(),
    };

    init_tracing(&config).unwrap();
    TracingLogger::new("init").debug(None, "subscriber installed");

    let err = init_tracing(&LoggingConfig::default()).unwrap_err();
    assert!(matches!(err, CoreError::Logging(_)));
    assert!(err.to_string().contains("Failed to install subscriber"));
}
