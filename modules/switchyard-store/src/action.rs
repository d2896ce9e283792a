//! Actions and action creators.

use std::any::Any;
use std::fmt;

use serde_json::{json, Value};

/// A typed message flowing through the store.
///
/// `payload` is plain data. `meta` is opaque and may carry anything,
/// including callbacks, so it never appears in the JSON view.
pub struct Action {
    pub action_type: String,
    pub payload: Value,
    pub meta: Option<Box<dyn Any>>,
}

impl Action {
    pub fn new(action_type: impl Into<String>) -> Self {
        Self {
            action_type: action_type.into(),
            payload: Value::Null,
            meta: None,
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_meta<M: Any>(mut self, meta: M) -> Self {
        self.meta = Some(Box::new(meta));
        self
    }

    pub fn has_meta(&self) -> bool {
        self.meta.is_some()
    }

    /// Borrow the meta if it holds an `M`.
    pub fn meta_ref<M: Any>(&self) -> Option<&M> {
        self.meta.as_ref()?.downcast_ref::<M>()
    }

    /// Remove and return the meta if it holds an `M`.
    ///
    /// A meta of any other type is left in place.
    pub fn take_meta<M: Any>(&mut self) -> Option<M> {
        let meta = self.meta.take()?;
        match meta.downcast::<M>() {
            Ok(meta) => Some(*meta),
            Err(other) => {
                self.meta = Some(other);
                None
            }
        }
    }

    /// Wire view of the action: `{ "type": ..., "payload": ... }`.
    pub fn to_json(&self) -> Value {
        json!({
            "type": self.action_type,
            "payload": self.payload,
        })
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("action_type", &self.action_type)
            .field("payload", &self.payload)
            .field("has_meta", &self.has_meta())
            .finish()
    }
}

/// Builds actions of one fixed type and recognizes them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActionCreator {
    action_type: String,
}

impl ActionCreator {
    pub fn new(action_type: impl Into<String>) -> Self {
        Self {
            action_type: action_type.into(),
        }
    }

    pub fn action_type(&self) -> &str {
        &self.action_type
    }

    pub fn create(&self, payload: Value) -> Action {
        Action::new(self.action_type.clone()).with_payload(payload)
    }

    pub fn matches(&self, action: &Action) -> bool {
        action.action_type == self.action_type
    }
}

impl AsRef<str> for ActionCreator {
    fn as_ref(&self) -> &str {
        &self.action_type
    }
}

impl fmt::Display for ActionCreator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.action_type)
    }
}
