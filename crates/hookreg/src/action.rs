//! Action types stored by the registries.
//!
//! An action is a shared callable plus an optional diagnostic label. The
//! label only feeds log lines; two actions may share one, and an action
//! without a label reports itself as [`ANONYMOUS`].

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::{self, BoxFuture};

/// Name reported for actions registered without a label.
pub const ANONYMOUS: &str = "anonymous";

/// Future returned by an asynchronous action.
pub type ActionFuture<E> = BoxFuture<'static, Result<(), E>>;

type SyncFn<P, E> = dyn Fn(&P) -> Result<(), E> + Send + Sync;
type AsyncFn<P, E> = dyn Fn(P) -> ActionFuture<E> + Send + Sync;

/// Anything that can describe itself in a log line.
pub trait NamedAction {
    /// Returns the diagnostic label, never empty.
    fn name(&self) -> &str;
}

fn display_name(label: Option<&str>) -> &str {
    match label {
        Some(name) if !name.is_empty() => name,
        _ => ANONYMOUS,
    }
}

/// Struct-based synchronous action.
pub trait SyncHandler<P, E>: Send + Sync {
    /// Runs the action against the payload.
    fn call(&self, payload: &P) -> Result<(), E>;

    /// Optional diagnostic label.
    fn name(&self) -> Option<&str> {
        None
    }
}

/// Struct-based asynchronous action.
#[async_trait]
pub trait AsyncHandler<P, E>: Send + Sync
where
    P: Send + 'static,
{
    /// Runs the action against its own copy of the payload.
    async fn call(&self, payload: P) -> Result<(), E>;

    /// Optional diagnostic label.
    fn name(&self) -> Option<&str> {
        None
    }
}

/// A callable run by [`SyncHookRegistry`](crate::SyncHookRegistry).
pub struct SyncAction<P, E> {
    label: Option<Arc<str>>,
    func: Arc<SyncFn<P, E>>,
}

impl<P: 'static, E: 'static> SyncAction<P, E> {
    /// Wraps an unlabelled closure.
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&P) -> Result<(), E> + Send + Sync + 'static,
    {
        Self {
            label: None,
            func: Arc::new(func),
        }
    }

    /// Wraps a closure with a diagnostic label.
    pub fn named<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&P) -> Result<(), E> + Send + Sync + 'static,
    {
        Self::new(func).with_name(name)
    }

    /// Wraps a [`SyncHandler`], taking its label if it has one.
    pub fn from_handler<H>(handler: Arc<H>) -> Self
    where
        H: SyncHandler<P, E> + 'static,
    {
        let label = handler.name().map(Arc::from);
        Self {
            label,
            func: Arc::new(move |payload: &P| handler.call(payload)),
        }
    }
}

impl<P, E> SyncAction<P, E> {
    /// Replaces the diagnostic label.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.label = Some(Arc::from(name.into()));
        self
    }

    /// Invokes the action.
    pub fn call(&self, payload: &P) -> Result<(), E> {
        (self.func)(payload)
    }
}

impl<P, E> NamedAction for SyncAction<P, E> {
    fn name(&self) -> &str {
        display_name(self.label.as_deref())
    }
}

impl<P, E> Clone for SyncAction<P, E> {
    fn clone(&self) -> Self {
        Self {
            label: self.label.clone(),
            func: Arc::clone(&self.func),
        }
    }
}

impl<P, E> fmt::Debug for SyncAction<P, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncAction")
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}

/// A callable run by [`AsyncHookRegistry`](crate::AsyncHookRegistry).
///
/// Invoking the callable starts the action; the returned future completes it.
/// Synchronous work and synchronous failures are normalized into a ready
/// future, so the registry joins every action the same way.
pub struct AsyncAction<P, E> {
    label: Option<Arc<str>>,
    func: Arc<AsyncFn<P, E>>,
}

impl<P, E> AsyncAction<P, E>
where
    P: Send + 'static,
    E: Send + 'static,
{
    /// Wraps an unlabelled closure returning a future.
    ///
    /// The closure itself is invoked when the batch starts, in registration
    /// order. Only the returned future runs concurrently.
    pub fn new<F, Fut>(func: F) -> Self
    where
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
    {
        Self {
            label: None,
            func: Arc::new(move |payload: P| -> ActionFuture<E> { func(payload).boxed() }),
        }
    }

    /// Wraps a labelled closure returning a future.
    pub fn named<F, Fut>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
    {
        Self::new(func).with_name(name)
    }

    /// Wraps a synchronous closure. It runs when the batch starts.
    pub fn from_fn<F>(func: F) -> Self
    where
        F: Fn(P) -> Result<(), E> + Send + Sync + 'static,
    {
        Self {
            label: None,
            func: Arc::new(move |payload: P| -> ActionFuture<E> {
                future::ready(func(payload)).boxed()
            }),
        }
    }

    /// Wraps a labelled synchronous closure.
    pub fn named_fn<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(P) -> Result<(), E> + Send + Sync + 'static,
    {
        Self::from_fn(func).with_name(name)
    }

    /// Wraps an [`AsyncHandler`], taking its label if it has one.
    pub fn from_handler<H>(handler: Arc<H>) -> Self
    where
        H: AsyncHandler<P, E> + 'static,
    {
        let label = handler.name().map(Arc::from);
        Self {
            label,
            func: Arc::new(move |payload: P| -> ActionFuture<E> {
                let handler = Arc::clone(&handler);
                async move { handler.call(payload).await }.boxed()
            }),
        }
    }
}

impl<P, E> AsyncAction<P, E> {
    /// Replaces the diagnostic label.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.label = Some(Arc::from(name.into()));
        self
    }

    /// Starts the action by invoking its closure, and returns its completion.
    pub fn start(&self, payload: P) -> ActionFuture<E> {
        (self.func)(payload)
    }
}

impl<P, E> NamedAction for AsyncAction<P, E> {
    fn name(&self) -> &str {
        display_name(self.label.as_deref())
    }
}

impl<P, E> Clone for AsyncAction<P, E> {
    fn clone(&self) -> Self {
        Self {
            label: self.label.clone(),
            func: Arc::clone(&self.func),
        }
    }
}

impl<P, E> fmt::Debug for AsyncAction<P, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncAction")
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}
