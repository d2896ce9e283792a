//! Turns a subscription target into the action type it stands for.

use serde_json::Value;
use switchyard_store::{Action, ActionCreator};

use crate::error::ListenerError;

/// Anything that can name an action type: a raw tag, an action creator,
/// an action, or a JSON object with a string `type` field.
pub trait TypedSource {
    fn source_type(&self) -> Option<&str>;

    /// Used in error messages when `source_type` comes back empty.
    fn describe(&self) -> String {
        "a value without a type".to_string()
    }
}

impl TypedSource for str {
    fn source_type(&self) -> Option<&str> {
        Some(self)
    }
}

impl TypedSource for String {
    fn source_type(&self) -> Option<&str> {
        Some(self)
    }
}

impl TypedSource for ActionCreator {
    fn source_type(&self) -> Option<&str> {
        Some(self.action_type())
    }
}

impl TypedSource for Action {
    fn source_type(&self) -> Option<&str> {
        Some(&self.action_type)
    }
}

impl TypedSource for Value {
    fn source_type(&self) -> Option<&str> {
        self.get("type").and_then(Value::as_str)
    }

    fn describe(&self) -> String {
        format!("{self} (no string `type` field)")
    }
}

impl<T: TypedSource + ?Sized> TypedSource for &T {
    fn source_type(&self) -> Option<&str> {
        (**self).source_type()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Resolve the canonical action type key for a target.
pub fn resolve_type<T: TypedSource + ?Sized>(source: &T) -> Result<String, ListenerError> {
    source
        .source_type()
        .map(str::to_string)
        .ok_or_else(|| ListenerError::TypeResolution(source.describe()))
}
