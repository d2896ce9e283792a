//! The listener middleware.
//!
//! Sits in the store pipeline and delivers every action to the listeners
//! subscribed to its type before (optionally) forwarding it on.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;
use switchyard_common::Config;
use switchyard_store::{Action, Dispatched, Middleware, Next, StoreApi};
use tracing::{debug, trace};

use crate::error::ListenerError;
use crate::listener::{Listener, ListenerOptions};
use crate::meta::{AddListenerMeta, MetaActions, RemoveListenerMeta};
use crate::registry::{ListenerEntry, Registry};
use crate::resolver::{resolve_type, TypedSource};
use crate::subscription::Subscription;

enum Propagation {
    Continue,
    Stopped,
}

/// Dynamic listener stage.
///
/// Each instance owns its own registry. Clones share it, so keep a clone
/// for `add_listener` / `remove_listener` and hand another to the store.
///
/// Per dispatched action:
/// 1. `<ns>/add` → subscribe, strip `meta`, forward, return the `Subscription`.
/// 2. `<ns>/remove` → unsubscribe, then carry on as a normal action.
/// 3. Walk the listeners subscribed to the action type in subscription order.
///    The walk works on a snapshot of the entries and re-checks each one
///    against the live registry right before running it, so listeners may
///    subscribe, unsubscribe and dispatch while the walk is in progress.
/// 4. Forward to the next stage unless a `prevent_propagation` listener ran.
pub struct ListenerMiddleware<S> {
    registry: Rc<RefCell<Registry<S>>>,
    meta: MetaActions,
}

impl<S> Clone for ListenerMiddleware<S> {
    fn clone(&self) -> Self {
        Self {
            registry: Rc::clone(&self.registry),
            meta: self.meta.clone(),
        }
    }
}

impl<S: 'static> ListenerMiddleware<S> {
    pub fn new() -> Self {
        Self::with_meta_actions(MetaActions::default())
    }

    pub fn with_namespace(namespace: &str) -> Self {
        Self::with_meta_actions(MetaActions::new(namespace))
    }

    pub fn from_config(config: &Config) -> Self {
        Self::with_namespace(&config.listener_namespace)
    }

    fn with_meta_actions(meta: MetaActions) -> Self {
        Self {
            registry: Rc::new(RefCell::new(Registry::new())),
            meta,
        }
    }

    pub fn meta_actions(&self) -> &MetaActions {
        &self.meta
    }

    /// Subscribe `listener` to the target's action type.
    ///
    /// Subscribing a listener that is already subscribed to that type returns
    /// a handle for the existing subscription; the new `options` are ignored.
    pub fn add_listener(
        &self,
        target: impl TypedSource,
        listener: Listener<S>,
        options: ListenerOptions<S>,
    ) -> Result<Subscription, ListenerError> {
        let action_type = resolve_type(&target)?;
        let (entry, created) = self
            .registry
            .borrow_mut()
            .add(&action_type, listener, options);

        if created {
            debug!(
                action_type = %action_type,
                entry_id = entry.id(),
                once = entry.once(),
                prevent_propagation = entry.prevent_propagation(),
                conditional = entry.has_condition(),
                "Listener subscribed"
            );
        } else {
            debug!(
                action_type = %action_type,
                entry_id = entry.id(),
                "Listener already subscribed"
            );
        }

        Ok(Subscription::new(&self.registry, &action_type, &entry))
    }

    /// Unsubscribe `listener`. `Ok(false)` when it was not subscribed.
    pub fn remove_listener(
        &self,
        target: impl TypedSource,
        listener: &Listener<S>,
    ) -> Result<bool, ListenerError> {
        let action_type = resolve_type(&target)?;
        let removed = self.registry.borrow_mut().remove(&action_type, listener);
        debug!(action_type = %action_type, removed, "Listener removal requested");
        Ok(removed)
    }

    /// Build an add action in this middleware's namespace.
    pub fn add_action(
        &self,
        target: impl TypedSource,
        listener: Listener<S>,
        options: Option<ListenerOptions<S>>,
    ) -> Result<Action, ListenerError> {
        self.meta.add(target, listener, options)
    }

    /// Build a remove action in this middleware's namespace.
    pub fn remove_action(
        &self,
        target: impl TypedSource,
        listener: Listener<S>,
    ) -> Result<Action, ListenerError> {
        self.meta.remove(target, listener)
    }

    pub fn listener_count(&self, target: impl TypedSource) -> Result<usize, ListenerError> {
        let action_type = resolve_type(&target)?;
        Ok(self.registry.borrow().listener_count(&action_type))
    }

    pub fn has_listener(
        &self,
        target: impl TypedSource,
        listener: &Listener<S>,
    ) -> Result<bool, ListenerError> {
        let action_type = resolve_type(&target)?;
        Ok(self.registry.borrow().find(&action_type, listener).is_some())
    }

    /// Whether the registry holds a (possibly empty) collection for the type.
    pub fn is_tracking(&self, target: impl TypedSource) -> Result<bool, ListenerError> {
        let action_type = resolve_type(&target)?;
        Ok(self.registry.borrow().is_tracking(&action_type))
    }

    /// Drop empty per-type collections left behind by removals.
    pub fn prune_empty(&self) -> usize {
        self.registry.borrow_mut().prune_empty()
    }

    fn handle_add(&self, action: &mut Action) -> Result<Subscription, ListenerError> {
        let target = resolve_type(&action.payload)?;
        let had_meta = action.has_meta();
        let Some(meta) = action.take_meta::<AddListenerMeta<S>>() else {
            return Err(malformed(action, had_meta));
        };
        self.add_listener(
            target.as_str(),
            meta.listener,
            meta.options.unwrap_or_default(),
        )
    }

    fn handle_remove(&self, action: &Action) -> Result<bool, ListenerError> {
        let target = resolve_type(&action.payload)?;
        let Some(meta) = action.meta_ref::<RemoveListenerMeta<S>>() else {
            return Err(malformed(action, action.has_meta()));
        };
        self.remove_listener(target.as_str(), &meta.listener)
    }

    fn deliver(&self, api: &StoreApi<'_, S>, action: &Action) -> Result<Propagation> {
        let action_type = action.action_type.as_str();
        let snapshot = self.registry.borrow().snapshot(action_type);

        for entry in snapshot {
            let still_subscribed = self.registry.borrow().contains_entry(action_type, &entry);
            if !still_subscribed {
                trace!(action_type, entry_id = entry.id(), "Skipping removed listener");
                continue;
            }
            if entry.once() && entry.is_in_flight() {
                trace!(
                    action_type,
                    entry_id = entry.id(),
                    "Skipping once listener already running"
                );
                continue;
            }
            if !api.with_state(|state| entry.accepts(action, state)) {
                trace!(action_type, entry_id = entry.id(), "Condition rejected action");
                continue;
            }

            trace!(action_type, entry_id = entry.id(), "Delivering action to listener");
            let outcome = {
                let _in_flight = InFlightGuard::enter(&entry);
                entry.listener().call(action, api)
            };
            outcome?;

            if entry.once() {
                self.registry.borrow_mut().remove_entry(action_type, &entry);
                debug!(action_type, entry_id = entry.id(), "Once listener removed after run");
            }
            if entry.prevent_propagation() {
                debug!(action_type, entry_id = entry.id(), "Listener stopped propagation");
                return Ok(Propagation::Stopped);
            }
        }

        Ok(Propagation::Continue)
    }
}

impl<S: 'static> Default for ListenerMiddleware<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: 'static> Middleware<S> for ListenerMiddleware<S> {
    fn handle(
        &self,
        api: &StoreApi<'_, S>,
        next: Next<'_, S>,
        mut action: Action,
    ) -> Result<Dispatched> {
        if self.meta.is_add(&action) {
            let subscription = self.handle_add(&mut action)?;
            next.run(action)?;
            return Ok(Dispatched::value(subscription));
        }

        if self.meta.is_remove(&action) {
            self.handle_remove(&action)?;
        }

        match self.deliver(api, &action)? {
            Propagation::Stopped => Ok(Dispatched::Action(action)),
            Propagation::Continue => next.run(action),
        }
    }
}

/// Marks an entry as running until dropped, including on unwind.
struct InFlightGuard<'a, S> {
    entry: &'a ListenerEntry<S>,
}

impl<'a, S> InFlightGuard<'a, S> {
    fn enter(entry: &'a ListenerEntry<S>) -> Self {
        entry.set_in_flight(true);
        Self { entry }
    }
}

impl<S> Drop for InFlightGuard<'_, S> {
    fn drop(&mut self) {
        self.entry.set_in_flight(false);
    }
}

fn malformed(action: &Action, had_meta: bool) -> ListenerError {
    let reason = if had_meta {
        "meta does not carry a listener for this store's state type"
    } else {
        "meta is missing"
    };
    ListenerError::MalformedMeta {
        action_type: action.action_type.clone(),
        reason: reason.to_string(),
    }
}
