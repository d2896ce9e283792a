//! Listener callbacks and their delivery options.

use std::fmt;
use std::rc::Rc;

use anyhow::Result;
use switchyard_store::{Action, StoreApi};

pub type ListenerFn<S> = dyn Fn(&Action, &StoreApi<'_, S>) -> Result<()>;

/// Decides per action whether a listener runs. Sees the current state.
pub type Condition<S> = Rc<dyn Fn(&Action, &S) -> bool>;

/// A shared listener callback.
///
/// Identity is the allocation: clones of one `Listener` are the same
/// listener, two `Listener::new` calls on equal closures are not.
pub struct Listener<S> {
    callback: Rc<ListenerFn<S>>,
}

impl<S> Listener<S> {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&Action, &StoreApi<'_, S>) -> Result<()> + 'static,
    {
        Self {
            callback: Rc::new(callback),
        }
    }

    pub fn same(&self, other: &Listener<S>) -> bool {
        Rc::ptr_eq(&self.callback, &other.callback)
    }

    pub fn call(&self, action: &Action, api: &StoreApi<'_, S>) -> Result<()> {
        (self.callback)(action, api)
    }
}

impl<S> Clone for Listener<S> {
    fn clone(&self) -> Self {
        Self {
            callback: Rc::clone(&self.callback),
        }
    }
}

impl<S> fmt::Debug for Listener<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({:p})", Rc::as_ptr(&self.callback) as *const ())
    }
}

/// How a listener is delivered to.
pub struct ListenerOptions<S> {
    /// Remove the listener after its first run.
    pub once: bool,
    /// After this listener runs, skip every later listener for the action
    /// and do not forward the action down the pipeline. Has no effect when
    /// the condition skipped the listener.
    pub prevent_propagation: bool,
    /// Run only when this returns true. `None` means always.
    pub condition: Option<Condition<S>>,
}

impl<S> ListenerOptions<S> {
    pub fn new() -> Self {
        Self {
            once: false,
            prevent_propagation: false,
            condition: None,
        }
    }

    pub fn with_once(mut self, once: bool) -> Self {
        self.once = once;
        self
    }

    pub fn with_prevent_propagation(mut self, prevent_propagation: bool) -> Self {
        self.prevent_propagation = prevent_propagation;
        self
    }

    pub fn with_condition<F>(mut self, condition: F) -> Self
    where
        F: Fn(&Action, &S) -> bool + 'static,
    {
        self.condition = Some(Rc::new(condition));
        self
    }
}

impl<S> Default for ListenerOptions<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Clone for ListenerOptions<S> {
    fn clone(&self) -> Self {
        Self {
            once: self.once,
            prevent_propagation: self.prevent_propagation,
            condition: self.condition.clone(),
        }
    }
}

impl<S> fmt::Debug for ListenerOptions<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerOptions")
            .field("once", &self.once)
            .field("prevent_propagation", &self.prevent_propagation)
            .field("condition", &self.condition.is_some())
            .finish()
    }
}
