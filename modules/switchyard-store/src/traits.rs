//! Core traits for the store pipeline.

use anyhow::Result;

use crate::action::Action;
use crate::store::{Dispatched, Next, StoreApi};

/// Pure state updates. No I/O, no side effects.
///
/// Terminal stage of every dispatch that makes it through the middleware chain.
pub trait Reducer<S> {
    fn reduce(&self, state: &mut S, action: &Action);
}

impl<S, F> Reducer<S> for F
where
    F: Fn(&mut S, &Action),
{
    fn reduce(&self, state: &mut S, action: &Action) {
        self(state, action)
    }
}

/// A stage in front of the reducer.
///
/// A middleware sees the action before any later stage. It may hand it on
/// with `next.run(action)`, return early without forwarding, or dispatch
/// further actions through `api` (those start again at the top of the chain).
pub trait Middleware<S> {
    fn handle(&self, api: &StoreApi<'_, S>, next: Next<'_, S>, action: Action)
        -> Result<Dispatched>;
}
