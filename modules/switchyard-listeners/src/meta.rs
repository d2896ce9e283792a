//! Listener meta-actions.
//!
//! Subscribing and unsubscribing can also be done by dispatching:
//!
//! ```text
//! { type: "<ns>/add",    payload: { type }, meta: { listener, options? } }
//! { type: "<ns>/remove", payload: { type }, meta: { listener } }
//! ```
//!
//! The middleware recognizes these by type and delegates to its direct
//! `add_listener` / `remove_listener` methods.

use serde_json::json;
use switchyard_common::DEFAULT_LISTENER_NAMESPACE;
use switchyard_store::{Action, ActionCreator};

use crate::error::ListenerError;
use crate::listener::{Listener, ListenerOptions};
use crate::resolver::{resolve_type, TypedSource};

/// `meta` of an add action.
pub struct AddListenerMeta<S> {
    pub listener: Listener<S>,
    pub options: Option<ListenerOptions<S>>,
}

/// `meta` of a remove action.
pub struct RemoveListenerMeta<S> {
    pub listener: Listener<S>,
}

/// Builds and recognizes the add/remove actions of one namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaActions {
    add: ActionCreator,
    remove: ActionCreator,
}

impl MetaActions {
    pub fn new(namespace: &str) -> Self {
        Self {
            add: ActionCreator::new(format!("{namespace}/add")),
            remove: ActionCreator::new(format!("{namespace}/remove")),
        }
    }

    pub fn add_type(&self) -> &str {
        self.add.action_type()
    }

    pub fn remove_type(&self) -> &str {
        self.remove.action_type()
    }

    pub fn is_add(&self, action: &Action) -> bool {
        self.add.matches(action)
    }

    pub fn is_remove(&self, action: &Action) -> bool {
        self.remove.matches(action)
    }

    pub fn add<S: 'static>(
        &self,
        target: impl TypedSource,
        listener: Listener<S>,
        options: Option<ListenerOptions<S>>,
    ) -> Result<Action, ListenerError> {
        let action_type = resolve_type(&target)?;
        Ok(self
            .add
            .create(json!({ "type": action_type }))
            .with_meta(AddListenerMeta { listener, options }))
    }

    pub fn remove<S: 'static>(
        &self,
        target: impl TypedSource,
        listener: Listener<S>,
    ) -> Result<Action, ListenerError> {
        let action_type = resolve_type(&target)?;
        Ok(self
            .remove
            .create(json!({ "type": action_type }))
            .with_meta(RemoveListenerMeta { listener }))
    }
}

impl Default for MetaActions {
    fn default() -> Self {
        Self::new(DEFAULT_LISTENER_NAMESPACE)
    }
}

/// Add action in the default namespace.
pub fn add_listener_action<S: 'static>(
    target: impl TypedSource,
    listener: Listener<S>,
    options: Option<ListenerOptions<S>>,
) -> Result<Action, ListenerError> {
    MetaActions::default().add(target, listener, options)
}

/// Remove action in the default namespace.
pub fn remove_listener_action<S: 'static>(
    target: impl TypedSource,
    listener: Listener<S>,
) -> Result<Action, ListenerError> {
    MetaActions::default().remove(target, listener)
}

/// Whether `action` is an add action in the default namespace.
pub fn is_add_action(action: &Action) -> bool {
    MetaActions::default().is_add(action)
}

pub fn is_remove_action(action: &Action) -> bool {
    MetaActions::default().is_remove(action)
}
