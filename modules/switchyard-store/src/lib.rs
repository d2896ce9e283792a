//! Synchronous action store.
//!
//! Provides a linear pipeline: dispatch → middleware chain → reducer.
//! Middleware may short-circuit, forward, or dispatch new actions
//! reentrantly from inside their own handling.
//!
//! Consumers define their domain by implementing `Reducer` (pure state
//! updates, or a `CaseReducer` built per action type) and `Middleware`
//! (stages that intercept actions before they reach the reducer).

pub mod action;
pub mod case_reducer;
pub mod error;
pub mod recorder;
pub mod store;
pub mod traits;

pub use action::{Action, ActionCreator};
pub use case_reducer::CaseReducer;
pub use error::StoreError;
pub use recorder::{ActionRecorder, StoredAction};
pub use store::{Dispatched, Next, Store, StoreApi};
pub use traits::{Middleware, Reducer};
