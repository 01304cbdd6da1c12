//! Base registry: the order-batched action store shared by both firing
//! strategies.
//!
//! Actions are grouped per hook name, then per integer order key. Keys are
//! kept sorted so a lookup yields batches in ascending order without a sort
//! step; within one key, actions keep their registration order.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use serde_json::json;
use tracing::trace;

use hookreg_core::config::registry::RegistryConfig;
use hookreg_core::logging::{HookLogger, TracingLogger};

use crate::action::NamedAction;

/// Order key used when none is given.
pub const DEFAULT_ORDER: i64 = 0;

/// Order key → actions in registration order.
type OrderMap<A> = BTreeMap<i64, Vec<A>>;

/// Store of actions keyed by hook name and order, plus the optional logger.
pub struct BaseRegistry<A> {
    /// Hook name → order-keyed actions.
    hooks: HashMap<String, OrderMap<A>>,
    /// Sink for fire-time log lines.
    logger: Option<Arc<dyn HookLogger>>,
    /// Whether to emit the per-batch debug line.
    log_batches: bool,
}

impl<A> BaseRegistry<A> {
    /// Creates an empty registry without a logger.
    pub fn new() -> Self {
        Self {
            hooks: HashMap::new(),
            logger: None,
            log_batches: true,
        }
    }

    /// Creates an empty registry logging to `logger`.
    pub fn with_logger(logger: Arc<dyn HookLogger>) -> Self {
        Self {
            logger: Some(logger),
            ..Self::new()
        }
    }

    /// Creates an empty registry logging through `tracing`, labelled and
    /// gated by `config`.
    pub fn from_config(config: &RegistryConfig) -> Self {
        Self {
            hooks: HashMap::new(),
            logger: Some(Arc::new(TracingLogger::from_config(config))),
            log_batches: config.log_batches,
        }
    }

    /// Registers `action` under `hook` with the default order key.
    pub fn register(&mut self, hook: impl Into<String>, action: A)
    where
        A: NamedAction,
    {
        self.register_with_order(hook, action, DEFAULT_ORDER);
    }

    /// Appends `action` to the `order` batch of `hook`.
    ///
    /// The same action may be registered any number of times; each
    /// registration runs independently.
    pub fn register_with_order(&mut self, hook: impl Into<String>, action: A, order: i64)
    where
        A: NamedAction,
    {
        let hook = hook.into();
        trace!(hook = %hook, order, action = action.name(), "Hook action registered");

        self.hooks
            .entry(hook)
            .or_default()
            .entry(order)
            .or_default()
            .push(action);
    }

    /// Returns the batches for `hook`, ascending by order key.
    ///
    /// Unknown hooks yield an empty list.
    pub fn get_actions_batch(&self, hook: &str) -> Vec<&[A]> {
        self.hooks
            .get(hook)
            .map(|orders| orders.values().map(Vec::as_slice).collect())
            .unwrap_or_default()
    }

    /// Removes every registration for every hook.
    pub fn clear(&mut self) {
        self.hooks.clear();
        trace!("All hook actions cleared");
    }

    /// Removes every registration for one hook. Returns whether it had any.
    pub fn clear_hook(&mut self, hook: &str) -> bool {
        let removed = self.hooks.remove(hook).is_some();
        if removed {
            trace!(hook = %hook, "Hook actions cleared");
        }
        removed
    }

    /// Returns whether any action is registered under `hook`.
    pub fn has_actions(&self, hook: &str) -> bool {
        self.hooks.contains_key(hook)
    }

    /// Returns the number of registrations under `hook`.
    pub fn action_count(&self, hook: &str) -> usize {
        self.hooks
            .get(hook)
            .map(|orders| orders.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    /// Returns all hook names with registrations, sorted.
    pub fn hook_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.hooks.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Replaces or removes the logger.
    pub fn set_logger(&mut self, logger: Option<Arc<dyn HookLogger>>) {
        self.logger = logger;
    }

    /// Returns the current logger.
    pub fn logger(&self) -> Option<&Arc<dyn HookLogger>> {
        self.logger.as_ref()
    }

    /// Toggles the per-batch debug line.
    pub fn set_log_batches(&mut self, enabled: bool) {
        self.log_batches = enabled;
    }

    /// Writes "Fired hook {hook} with actions: {names}".
    pub(crate) fn log_batch(&self, hook: &str, batch: &[A])
    where
        A: NamedAction,
    {
        let Some(logger) = self.logger.as_deref() else {
            return;
        };
        if !self.log_batches {
            return;
        }

        let names: Vec<&str> = batch.iter().map(NamedAction::name).collect();
        logger.debug(
            None,
            &format!("Fired hook {} with actions: {}", hook, names.join(", ")),
        );
    }

    /// Writes the failure line for `action` with `{ "error": .. }` attached.
    pub(crate) fn log_failure(&self, hook: &str, action: &str, error: &dyn fmt::Display) {
        if let Some(logger) = self.logger.as_deref() {
            logger.error(
                Some(&json!({ "error": error.to_string() })),
                &format!("Hook action '{}' for '{}' failed", action, hook),
            );
        }
    }
}

impl<A> Default for BaseRegistry<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for BaseRegistry<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseRegistry")
            .field("hooks", &self.hook_names())
            .field("has_logger", &self.logger.is_some())
            .field("log_batches", &self.log_batches)
            .finish()
    }
}
