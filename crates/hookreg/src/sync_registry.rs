//! Synchronous registry: batches in ascending order, actions one at a time.
//!
//! The first failing action aborts the rest of its batch and every later
//! batch. Its error is logged and returned unchanged.

use std::fmt;
use std::sync::Arc;

use hookreg_core::config::registry::RegistryConfig;
use hookreg_core::logging::HookLogger;

use crate::action::{NamedAction, SyncAction};
use crate::registry::BaseRegistry;

/// Registry whose [`fire`](Self::fire) runs on the calling thread.
///
/// `P` is the payload handed to every action by reference; hooks that need
/// different payloads can share an enum. `E` is whatever the actions fail
/// with.
pub struct SyncHookRegistry<P, E = anyhow::Error> {
    base: BaseRegistry<SyncAction<P, E>>,
}

impl<P, E> SyncHookRegistry<P, E> {
    /// Creates an empty registry without a logger.
    pub fn new() -> Self {
        Self {
            base: BaseRegistry::new(),
        }
    }

    /// Creates an empty registry logging to `logger`.
    pub fn with_logger(logger: Arc<dyn HookLogger>) -> Self {
        Self {
            base: BaseRegistry::with_logger(logger),
        }
    }

    /// Creates an empty registry logging through `tracing`.
    pub fn from_config(config: &RegistryConfig) -> Self {
        Self {
            base: BaseRegistry::from_config(config),
        }
    }

    /// Registers `action` under `hook` with order 0.
    pub fn register(&mut self, hook: impl Into<String>, action: SyncAction<P, E>) {
        self.base.register(hook, action);
    }

    /// Registers `action` under `hook` in the `order` batch.
    pub fn register_with_order(
        &mut self,
        hook: impl Into<String>,
        action: SyncAction<P, E>,
        order: i64,
    ) {
        self.base.register_with_order(hook, action, order);
    }

    /// Removes every registration.
    pub fn clear(&mut self) {
        self.base.clear();
    }

    /// Removes the registrations of one hook.
    pub fn clear_hook(&mut self, hook: &str) -> bool {
        self.base.clear_hook(hook)
    }

    /// Replaces or removes the logger used by later fires.
    pub fn set_logger(&mut self, logger: Option<Arc<dyn HookLogger>>) {
        self.base.set_logger(logger);
    }

    /// Returns the current logger.
    pub fn logger(&self) -> Option<&Arc<dyn HookLogger>> {
        self.base.logger()
    }

    /// Returns the underlying store.
    pub fn registry(&self) -> &BaseRegistry<SyncAction<P, E>> {
        &self.base
    }

    /// Returns the underlying store mutably.
    pub fn registry_mut(&mut self) -> &mut BaseRegistry<SyncAction<P, E>> {
        &mut self.base
    }

    /// Runs every action registered under `hook`.
    ///
    /// An unknown hook is a no-op.
    pub fn fire(&self, hook: &str, payload: &P) -> Result<(), E>
    where
        E: fmt::Display,
    {
        for batch in self.base.get_actions_batch(hook) {
            self.base.log_batch(hook, batch);

            for action in batch {
                if let Err(err) = action.call(payload) {
                    self.base.log_failure(hook, action.name(), &err);
                    return Err(err);
                }
            }
        }

        Ok(())
    }
}

impl<P, E> Default for SyncHookRegistry<P, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, E> fmt::Debug for SyncHookRegistry<P, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncHookRegistry")
            .field("base", &self.base)
            .finish()
    }
}
