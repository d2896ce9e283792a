use thiserror::Error;

#[derive(Error, Debug)]
pub enum SwitchyardError {
    #[error("Configuration error: {0}")]
    Config(String),
}
