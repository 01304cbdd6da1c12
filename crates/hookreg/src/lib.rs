//! # hookreg
//!
//! In-process extension points. Callers register named, ordered actions
//! under a hook name and later fire every action registered for it:
//!
//! - [`SyncHookRegistry`] runs batches in ascending order key and the actions
//!   of a batch one after another.
//! - [`AsyncHookRegistry`] runs batches in ascending order key and the actions
//!   of a batch concurrently.
//!
//! Both stop at the first failing action, log it through the optional
//! [`HookLogger`], and return the action's own error unchanged.
//!
//! ```
//! use hookreg::prelude::*;
//!
//! let mut hooks: SyncHookRegistry<String> = SyncHookRegistry::new();
//! hooks.register_with_order("greet", SyncAction::named("shout", |name: &String| {
//!     println!("HELLO {}", name.to_uppercase());
//!     Ok(())
//! }), 1);
//! hooks.register("greet", SyncAction::new(|name: &String| {
//!     println!("hello {name}");
//!     Ok(())
//! }));
//!
//! hooks.fire("greet", &"ada".to_string()).unwrap();
//! ```

pub mod action;
pub mod async_registry;
pub mod prelude;
pub mod registry;
pub mod sync_registry;

pub use action::{ANONYMOUS, AsyncAction, AsyncHandler, NamedAction, SyncAction, SyncHandler};
pub use async_registry::AsyncHookRegistry;
pub use hookreg_core::logging::HookLogger;
pub use registry::{BaseRegistry, DEFAULT_ORDER};
pub use sync_registry::SyncHookRegistry;
