//! Asynchronous registry: batches in ascending order, actions of one batch
//! concurrently.
//!
//! Every action of a batch is started in registration order: its closure is
//! invoked, then the returned future is spawned on the current tokio runtime.
//! Code in the closure before the future runs in registration order; the
//! future bodies run in whatever order the scheduler picks.
//!
//! The batch is joined through a `FuturesUnordered`, which yields outcomes as
//! they settle regardless of batch size. The first failure *by completion
//! order* fails the whole fire. When two actions of a batch fail, which error
//! surfaces depends on the scheduler, not on registration order.
//!
//! On failure the remaining join handles are dropped. Their tasks keep
//! running detached; anything they return afterwards, failures included, is
//! discarded. No later batch is started.

use std::fmt;
use std::sync::Arc;

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tracing::warn;

use hookreg_core::config::registry::RegistryConfig;
use hookreg_core::logging::HookLogger;

use crate::action::{AsyncAction, NamedAction};
use crate::registry::BaseRegistry;

/// Registry whose [`fire`](Self::fire) runs each batch concurrently.
///
/// Every action receives its own clone of the payload. Wrap large payloads in
/// an `Arc`. Firing requires a tokio runtime.
pub struct AsyncHookRegistry<P, E = anyhow::Error> {
    base: BaseRegistry<AsyncAction<P, E>>,
}

impl<P, E> AsyncHookRegistry<P, E> {
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
    pub fn register(&mut self, hook: impl Into<String>, action: AsyncAction<P, E>) {
        self.base.register(hook, action);
    }

    /// Registers `action` under `hook` in the `order` batch.
    pub fn register_with_order(
        &mut self,
        hook: impl Into<String>,
        action: AsyncAction<P, E>,
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
    pub fn registry(&self) -> &BaseRegistry<AsyncAction<P, E>> {
        &self.base
    }

    /// Returns the underlying store mutably.
    pub fn registry_mut(&mut self) -> &mut BaseRegistry<AsyncAction<P, E>> {
        &mut self.base
    }
}

impl<P, E> AsyncHookRegistry<P, E>
where
    P: Clone + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    /// Runs every action registered under `hook`.
    ///
    /// A batch must fully succeed before the next one starts. An unknown hook
    /// resolves immediately. A panicking action resumes the panic here.
    pub async fn fire(&self, hook: &str, payload: P) -> Result<(), E> {
        for batch in self.base.get_actions_batch(hook) {
            self.base.log_batch(hook, batch);

            let mut pending: FuturesUnordered<_> = batch
                .iter()
                .map(|action| {
                    let name = action.name().to_string();
                    let hook = hook.to_string();
                    let handle = tokio::spawn(action.start(payload.clone()));

                    async move {
                        match handle.await {
                            Ok(result) => result.map_err(|err| (name, err)),
                            Err(join_err) if join_err.is_panic() => {
                                std::panic::resume_unwind(join_err.into_panic())
                            }
                            Err(_) => {
                                warn!(
                                    hook = %hook,
                                    action = %name,
                                    "Hook action task was cancelled"
                                );
                                Ok(())
                            }
                        }
                    }
                })
                .collect();

            while let Some(outcome) = pending.next().await {
                if let Err((name, err)) = outcome {
                    self.base.log_failure(hook, &name, &err);
                    return Err(err);
                }
            }
        }

        Ok(())
    }
}

impl<P, E> Default for AsyncHookRegistry<P, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, E> fmt::Debug for AsyncHookRegistry<P, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncHookRegistry")
            .field("base", &self.base)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::panic::AssertUnwindSafe;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use anyhow::anyhow;
    use futures::FutureExt;
    use hookreg_core::logging::{LogLevel, MemoryLogger};
    use serde_json::json;
    use tokio::time::{Instant, sleep};

    use super::*;

    type Trail = Arc<Mutex<Vec<String>>>;

    fn push_after(
        trail: &Trail,
        name: &'static str,
        delay_ms: u64,
    ) -> AsyncAction<(), anyhow::Error> {
        let trail = trail.clone();
        AsyncAction::named(name, move |_| {
            let trail = trail.clone();
            async move {
                sleep(Duration::from_millis(delay_ms)).await;
                trail.lock().unwrap().push(name.to_string());
                Ok::<(), anyhow::Error>(())
            }
        })
    }

    fn fail_after(name: &'static str, delay_ms: u64) -> AsyncAction<(), anyhow::Error> {
        AsyncAction::named(name, move |_| async move {
            sleep(Duration::from_millis(delay_ms)).await;
            Err::<(), _>(anyhow!("{name} failed"))
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_fire_waits_for_batch_before_next() {
        let trail = Trail::default();
        let mut registry = AsyncHookRegistry::new();
        registry.register("x", push_after(&trail, "slow", 20));
        registry.register("x", push_after(&trail, "fast", 0));
        registry.register_with_order("x", push_after(&trail, "last", 0), 1);

        registry.fire("x", ()).await.unwrap();

        let trail = trail.lock().unwrap();
        assert_eq!(trail.len(), 3);
        assert_eq!(trail[2], "last");
        assert!(trail[..2].contains(&"slow".to_string()));
        assert!(trail[..2].contains(&"fast".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_runs_concurrently() {
        let trail = Trail::default();
        let mut registry = AsyncHookRegistry::new();
        registry.register("x", push_after(&trail, "a", 50));
        registry.register("x", push_after(&trail, "b", 80));

        let started = Instant::now();
        registry.fire("x", ()).await.unwrap();
        let elapsed = started.elapsed();

        assert!(elapsed >= Duration::from_millis(80));
        assert!(elapsed < Duration::from_millis(130));
    }

    #[tokio::test(start_paused = true)]
    async fn test_batches_run_sequentially() {
        let trail = Trail::default();
        let mut registry = AsyncHookRegistry::new();
        registry.register_with_order("x", push_after(&trail, "a", 50), 0);
        registry.register_with_order("x", push_after(&trail, "b", 80), 1);

        let started = Instant::now();
        registry.fire("x", ()).await.unwrap();

        assert!(started.elapsed() >= Duration::from_millis(130));
        assert_eq!(*trail.lock().unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_actions_start_in_registration_order() {
        let trail = Trail::default();
        let mut registry = AsyncHookRegistry::new();
        for name in ["one", "two", "three"] {
            let trail = trail.clone();
            registry.register(
                "x",
                AsyncAction::from_fn(move |_: ()| {
                    trail.lock().unwrap().push(name.to_string());
                    Ok::<(), anyhow::Error>(())
                }),
            );
        }

        registry.fire("x", ()).await.unwrap();
        assert_eq!(*trail.lock().unwrap(), vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn test_async_closures_invoked_in_registration_order() {
        let started = Trail::default();
        let finished = Trail::default();
        let mut registry = AsyncHookRegistry::new();
        for name in ["one", "two", "three"] {
            let started = started.clone();
            let finished = finished.clone();
            registry.register(
                "x",
                AsyncAction::new(move |_: ()| {
                    started.lock().unwrap().push(name.to_string());
                    let finished = finished.clone();
                    async move {
                        tokio::task::yield_now().await;
                        finished.lock().unwrap().push(name.to_string());
                        Ok::<(), anyhow::Error>(())
                    }
                }),
            );
        }

        registry.fire("x", ()).await.unwrap();
        assert_eq!(*started.lock().unwrap(), vec!["one", "two", "three"]);

        let mut finished = finished.lock().unwrap().clone();
        finished.sort();
        assert_eq!(finished, vec!["one", "three", "two"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_skips_later_batches() {
        let trail = Trail::default();
        let logger = Arc::new(MemoryLogger::new());
        let mut registry = AsyncHookRegistry::with_logger(logger.clone());
        registry.register("save", fail_after("validate", 0));
        registry.register_with_order("save", push_after(&trail, "persist", 0), 1);

        let err = registry.fire("save", ()).await.unwrap_err();
        assert_eq!(err.to_string(), "validate failed");

        sleep(Duration::from_millis(10)).await;
        assert!(trail.lock().unwrap().is_empty());

        let errors: Vec<_> = logger
            .entries()
            .into_iter()
            .filter(|e| e.level == LogLevel::Error)
            .collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Hook action 'validate' for 'save' failed");
        assert_eq!(errors[0].fields, Some(json!({ "error": "validate failed" })));
    }

    /// Batch sizes covering both small joins and batches above 30 actions.
    const FILLER_COUNTS: [usize; 4] = [0, 5, 31, 64];

    fn filler() -> AsyncAction<(), anyhow::Error> {
        AsyncAction::named_fn("filler", |_| Ok(()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_error_by_completion_order() {
        for fillers in FILLER_COUNTS {
            let mut registry = AsyncHookRegistry::new();
            registry.register("x", fail_after("registered-first", 50));
            for _ in 0..fillers {
                registry.register("x", filler());
            }
            registry.register("x", fail_after("settles-first", 5));

            let err = registry.fire("x", ()).await.unwrap_err();
            assert_eq!(err.to_string(), "settles-first failed", "fillers = {fillers}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_fail_does_not_wait_for_batch() {
        for fillers in FILLER_COUNTS {
            let finished = Arc::new(AtomicBool::new(false));
            let flag = finished.clone();
            let mut registry = AsyncHookRegistry::new();
            registry.register(
                "x",
                AsyncAction::new(move |_: ()| {
                    let flag = flag.clone();
                    async move {
                        sleep(Duration::from_secs(10)).await;
                        flag.store(true, Ordering::SeqCst);
                        Ok::<(), anyhow::Error>(())
                    }
                }),
            );
            for _ in 0..fillers {
                registry.register("x", filler());
            }
            registry.register("x", fail_after("quick", 0));

            let started = Instant::now();
            let err = registry.fire("x", ()).await.unwrap_err();
            assert_eq!(err.to_string(), "quick failed", "fillers = {fillers}");
            assert!(
                started.elapsed() < Duration::from_secs(1),
                "fillers = {fillers}, elapsed = {:?}",
                started.elapsed()
            );
            assert!(!finished.load(Ordering::SeqCst));

            sleep(Duration::from_secs(11)).await;
            assert!(finished.load(Ordering::SeqCst), "fillers = {fillers}");
        }
    }

    #[tokio::test]
    async fn test_sync_failure_is_normalized() {
        let logger = Arc::new(MemoryLogger::new());
        let mut registry = AsyncHookRegistry::with_logger(logger.clone());
        registry.register("x", AsyncAction::named_fn("check", |_: ()| Err(anyhow!("nope"))));

        let err = registry.fire("x", ()).await.unwrap_err();
        assert_eq!(err.to_string(), "nope");
        assert_eq!(
            logger.messages(LogLevel::Error),
            vec!["Hook action 'check' for 'x' failed".to_string()]
        );
    }

    #[tokio::test]
    async fn test_each_action_gets_payload_clone() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut registry: AsyncHookRegistry<String> = AsyncHookRegistry::new();
        for suffix in ["!", "?"] {
            let seen = seen.clone();
            registry.register(
                "greet",
                AsyncAction::from_fn(move |name: String| {
                    seen.lock().unwrap().push(format!("{name}{suffix}"));
                    Ok(())
                }),
            );
        }

        registry.fire("greet", "hi".to_string()).await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec!["hi!", "hi?"]);
    }

    #[tokio::test]
    async fn test_unknown_hook_resolves_silently() {
        let logger = Arc::new(MemoryLogger::new());
        let registry: AsyncHookRegistry<()> = AsyncHookRegistry::with_logger(logger.clone());

        registry.fire("unused", ()).await.unwrap();
        assert!(logger.is_empty());
    }

    #[tokio::test]
    async fn test_fire_logs_each_batch() {
        let logger = Arc::new(MemoryLogger::new());
        let mut registry: AsyncHookRegistry<()> = AsyncHookRegistry::with_logger(logger.clone());
        registry.register_with_order("x", AsyncAction::named_fn("late", |_| Ok(())), 3);
        registry.register_with_order("x", AsyncAction::named_fn("early", |_| Ok(())), -5);
        registry.register_with_order("x", AsyncAction::from_fn(|_| Ok(())), -5);

        registry.fire("x", ()).await.unwrap();
        assert_eq!(
            logger.messages(LogLevel::Debug),
            vec![
                "Fired hook x with actions: early, anonymous".to_string(),
                "Fired hook x with actions: late".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_panicking_action_resumes_panic() {
        async fn explode(_: ()) -> anyhow::Result<()> {
            panic!("action blew up")
        }

        let mut registry: AsyncHookRegistry<()> = AsyncHookRegistry::new();
        registry.register("x", AsyncAction::new(explode));

        let outcome = AssertUnwindSafe(registry.fire("x", ())).catch_unwind().await;
        assert!(outcome.is_err());
    }

    #[tokio::test]
    async fn test_clear_then_fire() {
        let trail = Trail::default();
        let mut registry = AsyncHookRegistry::new();
        registry.register("x", push_after(&trail, "a", 0));
        registry.clear();

        registry.fire("x", ()).await.unwrap();
        assert!(trail.lock().unwrap().is_empty());
    }
}
