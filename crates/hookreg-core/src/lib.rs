//! # hookreg-core
//!
//! Ambient pieces shared by the hook registries: the [`HookLogger`]
//! capability and its implementations, configuration schemas, subscriber
//! initialization, and the crate error type.
//!
//! This crate knows nothing about actions or firing.

pub mod config;
pub mod error;
pub mod logging;
pub mod result;

pub use config::HooksConfig;
pub use error::CoreError;
pub use logging::{HookLogger, LogEntry, LogLevel, MemoryLogger, TracingLogger, init_tracing};
pub use result::CoreResult;
