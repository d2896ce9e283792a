//! Revocation handles.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::debug;

use crate::registry::{ListenerEntry, Registry};

trait Revoke {
    fn revoke(&self) -> bool;
    fn is_active(&self) -> bool;
}

/// Points at one entry without keeping it (or its registry) alive.
struct EntryRef<S> {
    registry: Weak<RefCell<Registry<S>>>,
    action_type: String,
    entry: Weak<ListenerEntry<S>>,
}

impl<S> Revoke for EntryRef<S> {
    fn revoke(&self) -> bool {
        let (Some(registry), Some(entry)) = (self.registry.upgrade(), self.entry.upgrade()) else {
            return false;
        };
        let removed = registry
            .borrow_mut()
            .remove_entry(&self.action_type, &entry);
        if removed {
            debug!(
                action_type = %self.action_type,
                entry_id = entry.id(),
                "Listener unsubscribed"
            );
        }
        removed
    }

    fn is_active(&self) -> bool {
        match (self.registry.upgrade(), self.entry.upgrade()) {
            (Some(registry), Some(entry)) => {
                registry.borrow().contains_entry(&self.action_type, &entry)
            }
            _ => false,
        }
    }
}

/// Handle returned by a successful subscribe.
///
/// Bound to exactly one registry entry. `unsubscribe` removes that entry if
/// it is still registered; calling it again, or after the entry went away
/// some other way, does nothing.
#[derive(Clone)]
pub struct Subscription {
    action_type: String,
    target: Rc<dyn Revoke>,
}

impl Subscription {
    pub(crate) fn new<S: 'static>(
        registry: &Rc<RefCell<Registry<S>>>,
        action_type: &str,
        entry: &Rc<ListenerEntry<S>>,
    ) -> Self {
        Self {
            action_type: action_type.to_string(),
            target: Rc::new(EntryRef {
                registry: Rc::downgrade(registry),
                action_type: action_type.to_string(),
                entry: Rc::downgrade(entry),
            }),
        }
    }

    /// Returns true only on the call that actually removed the entry.
    pub fn unsubscribe(&self) -> bool {
        self.target.revoke()
    }

    pub fn is_active(&self) -> bool {
        self.target.is_active()
    }

    pub fn action_type(&self) -> &str {
        &self.action_type
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("action_type", &self.action_type)
            .field("active", &self.is_active())
            .finish()
    }
}
