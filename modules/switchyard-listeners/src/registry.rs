//! Per-middleware subscription registry.
//!
//! Entries are kept per action type in subscription order, which is also
//! delivery order. Listener counts per type are small, so lookups are a
//! linear identity scan.

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use switchyard_store::Action;

use crate::listener::{Condition, Listener, ListenerOptions};

/// A listener plus the options it was subscribed with.
pub struct ListenerEntry<S> {
    id: u64,
    listener: Listener<S>,
    once: bool,
    prevent_propagation: bool,
    condition: Option<Condition<S>>,
    /// Set while the listener runs. A running `once` listener is skipped by
    /// nested dispatches of the same action type.
    in_flight: Cell<bool>,
}

impl<S> ListenerEntry<S> {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn listener(&self) -> &Listener<S> {
        &self.listener
    }

    pub fn once(&self) -> bool {
        self.once
    }

    pub fn prevent_propagation(&self) -> bool {
        self.prevent_propagation
    }

    pub fn has_condition(&self) -> bool {
        self.condition.is_some()
    }

    pub fn accepts(&self, action: &Action, state: &S) -> bool {
        self.condition
            .as_ref()
            .map_or(true, |condition| condition(action, state))
    }

    pub(crate) fn is_in_flight(&self) -> bool {
        self.in_flight.get()
    }

    pub(crate) fn set_in_flight(&self, in_flight: bool) {
        self.in_flight.set(in_flight);
    }
}

/// Action type → ordered listener entries.
pub struct Registry<S> {
    listeners: HashMap<String, Vec<Rc<ListenerEntry<S>>>>,
    next_id: u64,
}

impl<S> Registry<S> {
    pub fn new() -> Self {
        Self {
            listeners: HashMap::new(),
            next_id: 0,
        }
    }

    /// Subscribe `listener` to `action_type`.
    ///
    /// Returns the entry and whether it was created. An existing entry for
    /// the same listener is returned as is; `options` are then ignored.
    pub fn add(
        &mut self,
        action_type: &str,
        listener: Listener<S>,
        options: ListenerOptions<S>,
    ) -> (Rc<ListenerEntry<S>>, bool) {
        if let Some(existing) = self.find(action_type, &listener) {
            return (Rc::clone(existing), false);
        }

        self.next_id += 1;
        let entry = Rc::new(ListenerEntry {
            id: self.next_id,
            listener,
            once: options.once,
            prevent_propagation: options.prevent_propagation,
            condition: options.condition,
            in_flight: Cell::new(false),
        });

        self.listeners
            .entry(action_type.to_string())
            .or_default()
            .push(Rc::clone(&entry));

        (entry, true)
    }

    pub fn find(&self, action_type: &str, listener: &Listener<S>) -> Option<&Rc<ListenerEntry<S>>> {
        self.entries_for(action_type)
            .iter()
            .find(|entry| entry.listener.same(listener))
    }

    /// Remove the entry for `listener`. The per-type collection stays, even when empty.
    pub fn remove(&mut self, action_type: &str, listener: &Listener<S>) -> bool {
        self.remove_where(action_type, |entry| entry.listener.same(listener))
    }

    /// Remove exactly this entry, if it is still registered.
    pub fn remove_entry(&mut self, action_type: &str, entry: &Rc<ListenerEntry<S>>) -> bool {
        self.remove_where(action_type, |candidate| Rc::ptr_eq(candidate, entry))
    }

    pub fn contains_entry(&self, action_type: &str, entry: &Rc<ListenerEntry<S>>) -> bool {
        self.entries_for(action_type)
            .iter()
            .any(|candidate| Rc::ptr_eq(candidate, entry))
    }

    /// Live entries for a type, in delivery order. Empty for unknown types.
    pub fn entries_for(&self, action_type: &str) -> &[Rc<ListenerEntry<S>>] {
        self.listeners
            .get(action_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The entries for a type at this instant. Holds references, not copies.
    pub fn snapshot(&self, action_type: &str) -> Vec<Rc<ListenerEntry<S>>> {
        self.entries_for(action_type).to_vec()
    }

    /// Whether a collection exists for the type (it may be empty).
    pub fn is_tracking(&self, action_type: &str) -> bool {
        self.listeners.contains_key(action_type)
    }

    pub fn listener_count(&self, action_type: &str) -> usize {
        self.entries_for(action_type).len()
    }

    /// Total entries across all types.
    pub fn len(&self) -> usize {
        self.listeners.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop the collections of types that no longer have listeners.
    ///
    /// Returns the number of types dropped.
    pub fn prune_empty(&mut self) -> usize {
        let before = self.listeners.len();
        self.listeners.retain(|_, entries| !entries.is_empty());
        before - self.listeners.len()
    }

    fn remove_where<P>(&mut self, action_type: &str, predicate: P) -> bool
    where
        P: Fn(&Rc<ListenerEntry<S>>) -> bool,
    {
        let Some(entries) = self.listeners.get_mut(action_type) else {
            return false;
        };
        match entries.iter().position(predicate) {
            Some(index) => {
                entries.remove(index);
                true
            }
            None => false,
        }
    }
}

impl<S> Default for Registry<S> {
    fn default() -> Self {
        Self::new()
    }
}
