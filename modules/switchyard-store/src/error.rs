use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Dispatch nested deeper than {limit} levels")]
    DepthExceeded { limit: usize },

    #[error("State is borrowed; dispatching from inside with_state is not allowed")]
    StateBorrowed,
}
