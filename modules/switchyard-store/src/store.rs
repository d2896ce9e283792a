//! The dispatch pipeline.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;

use anyhow::Result;
use switchyard_common::StoreConfig;
use tracing::trace;

use crate::action::Action;
use crate::error::StoreError;
use crate::traits::{Middleware, Reducer};

/// Synchronous, single-threaded action store.
///
/// dispatch → middleware[0] → ... → middleware[n-1] → reducer.
/// Any stage may stop the action early or dispatch new actions reentrantly;
/// nested dispatches run to completion before the outer stage resumes.
pub struct Store<S> {
    state: RefCell<S>,
    reducer: Box<dyn Reducer<S>>,
    middleware: Vec<Box<dyn Middleware<S>>>,
    config: StoreConfig,
    depth: Cell<usize>,
}

impl<S> Store<S> {
    pub fn new<R>(reducer: R, initial_state: S) -> Self
    where
        R: Reducer<S> + 'static,
    {
        Self {
            state: RefCell::new(initial_state),
            reducer: Box::new(reducer),
            middleware: Vec::new(),
            config: StoreConfig::default(),
            depth: Cell::new(0),
        }
    }

    /// Append a stage. The first stage added sees actions first.
    pub fn with_middleware<M>(mut self, middleware: M) -> Self
    where
        M: Middleware<S> + 'static,
    {
        self.middleware.push(Box::new(middleware));
        self
    }

    pub fn with_config(mut self, config: &StoreConfig) -> Self {
        self.config = config.clone();
        self
    }

    pub fn api(&self) -> StoreApi<'_, S> {
        StoreApi { store: self }
    }

    pub fn dispatch(&self, action: Action) -> Result<Dispatched> {
        self.api().dispatch(action)
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.state.borrow())
    }

    pub fn get_state(&self) -> S
    where
        S: Clone,
    {
        self.state.borrow().clone()
    }

    fn dispatch_from(&self, index: usize, action: Action) -> Result<Dispatched> {
        match self.middleware.get(index) {
            Some(stage) => {
                let next = Next {
                    store: self,
                    index: index + 1,
                };
                stage.handle(&self.api(), next, action)
            }
            None => {
                let mut state = self
                    .state
                    .try_borrow_mut()
                    .map_err(|_| StoreError::StateBorrowed)?;
                self.reducer.reduce(&mut state, &action);
                Ok(Dispatched::Action(action))
            }
        }
    }
}

/// What a stage hands to listeners and callbacks: state access plus dispatch.
pub struct StoreApi<'a, S> {
    store: &'a Store<S>,
}

impl<S> Clone for StoreApi<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for StoreApi<'_, S> {}

impl<'a, S> StoreApi<'a, S> {
    /// Dispatch from the top of the chain. Safe to call from inside a stage.
    pub fn dispatch(&self, action: Action) -> Result<Dispatched> {
        let store = self.store;
        let depth = store.depth.get() + 1;
        if depth > store.config.max_dispatch_depth {
            return Err(StoreError::DepthExceeded {
                limit: store.config.max_dispatch_depth,
            }
            .into());
        }

        trace!(action_type = %action.action_type, depth, "Dispatching action");

        let _guard = DepthGuard::enter(&store.depth);
        store.dispatch_from(0, action)
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        self.store.with_state(f)
    }

    pub fn get_state(&self) -> S
    where
        S: Clone,
    {
        self.store.get_state()
    }

    /// Current nesting level; 1 inside a top-level dispatch.
    pub fn depth(&self) -> usize {
        self.store.depth.get()
    }
}

/// Forwards an action to the stage after the current one.
pub struct Next<'a, S> {
    store: &'a Store<S>,
    index: usize,
}

impl<S> Next<'_, S> {
    pub fn run(self, action: Action) -> Result<Dispatched> {
        self.store.dispatch_from(self.index, action)
    }
}

struct DepthGuard<'a> {
    depth: &'a Cell<usize>,
}

impl<'a> DepthGuard<'a> {
    fn enter(depth: &'a Cell<usize>) -> Self {
        depth.set(depth.get() + 1);
        Self { depth }
    }
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }
}

/// Result of a dispatch.
///
/// The reducer stage yields the action back. A stage that short-circuits
/// may yield the action or any other value (e.g. a subscription handle).
pub enum Dispatched {
    Action(Action),
    Value(Box<dyn Any>),
}

impl Dispatched {
    pub fn value<T: Any>(value: T) -> Self {
        Self::Value(Box::new(value))
    }

    pub fn is_action(&self) -> bool {
        matches!(self, Self::Action(_))
    }

    pub fn as_action(&self) -> Option<&Action> {
        match self {
            Self::Action(action) => Some(action),
            Self::Value(_) => None,
        }
    }

    pub fn into_action(self) -> Option<Action> {
        match self {
            Self::Action(action) => Some(action),
            Self::Value(_) => None,
        }
    }

    pub fn into_value<T: Any>(self) -> Option<T> {
        match self {
            Self::Value(value) => value.downcast::<T>().ok().map(|v| *v),
            Self::Action(_) => None,
        }
    }
}

impl fmt::Debug for Dispatched {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Action(action) => f.debug_tuple("Action").field(action).finish(),
            Self::Value(_) => f.write_str("Value(..)"),
        }
    }
}
