//! Inspection middleware.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::store::{Dispatched, Next, StoreApi};
use crate::traits::Middleware;

/// An action as seen by the recorder. Meta is opaque, so only its presence is kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredAction {
    pub seq: u64,
    pub ts: DateTime<Utc>,
    pub action_type: String,
    pub payload: serde_json::Value,
    pub has_meta: bool,
}

/// Records every action that reaches it, then forwards it unchanged.
///
/// Clones share the same log, so keep one clone for assertions and hand
/// the other to the store.
#[derive(Clone, Default)]
pub struct ActionRecorder {
    next_seq: Rc<Cell<u64>>,
    actions: Rc<RefCell<Vec<StoredAction>>>,
}

impl ActionRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read all recorded actions (for test assertions).
    pub fn actions(&self) -> Vec<StoredAction> {
        self.actions.borrow().clone()
    }

    pub fn action_types(&self) -> Vec<String> {
        self.actions
            .borrow()
            .iter()
            .map(|a| a.action_type.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.actions.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.actions.borrow_mut().clear();
    }

    fn record(&self, action: &Action) {
        let seq = self.next_seq.get() + 1;
        self.next_seq.set(seq);
        self.actions.borrow_mut().push(StoredAction {
            seq,
            ts: Utc::now(),
            action_type: action.action_type.clone(),
            payload: action.payload.clone(),
            has_meta: action.has_meta(),
        });
    }
}

impl<S> Middleware<S> for ActionRecorder {
    fn handle(
        &self,
        _api: &StoreApi<'_, S>,
        next: Next<'_, S>,
        action: Action,
    ) -> Result<Dispatched> {
        self.record(&action);
        next.run(action)
    }
}
