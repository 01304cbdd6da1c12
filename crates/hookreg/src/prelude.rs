//! Convenience re-exports for registry users.

pub use crate::action::{AsyncAction, AsyncHandler, NamedAction, SyncAction, SyncHandler};
pub use crate::async_registry::AsyncHookRegistry;
pub use crate::sync_registry::SyncHookRegistry;
pub use hookreg_core::config::HooksConfig;
pub use hookreg_core::logging::{HookLogger, MemoryLogger, TracingLogger};
