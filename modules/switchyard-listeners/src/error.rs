use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ListenerError {
    #[error("Cannot resolve an action type from {0}")]
    TypeResolution(String),

    #[error("Malformed {action_type} action: {reason}")]
    MalformedMeta { action_type: String, reason: String },
}
