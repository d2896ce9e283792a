//! Dynamic listener middleware.
//!
//! A store stage that lets callers subscribe and unsubscribe listeners per
//! action type at runtime, either directly or by dispatching meta-actions
//! through the store itself. Delivery is ordered by subscription and
//! supports once-only listeners, conditional listeners and listeners that
//! stop the action from propagating further.

pub mod error;
pub mod listener;
pub mod meta;
pub mod middleware;
pub mod registry;
pub mod resolver;
pub mod subscription;

pub use error::ListenerError;
pub use listener::{Condition, Listener, ListenerFn, ListenerOptions};
pub use meta::{
    add_listener_action, is_add_action, is_remove_action, remove_listener_action, AddListenerMeta,
    MetaActions, RemoveListenerMeta,
};
pub use middleware::ListenerMiddleware;
pub use registry::{ListenerEntry, Registry};
pub use resolver::{resolve_type, TypedSource};
pub use subscription::Subscription;
