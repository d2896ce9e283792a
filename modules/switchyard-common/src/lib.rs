pub mod config;
pub mod error;

pub use config::{Config, StoreConfig, DEFAULT_LISTENER_NAMESPACE, DEFAULT_MAX_DISPATCH_DEPTH};
pub use error::SwitchyardError;
