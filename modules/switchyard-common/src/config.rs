use std::env;

use tracing::info;

use crate::error::SwitchyardError;

/// Namespace prefix of the listener meta-actions (`<ns>/add`, `<ns>/remove`).
pub const DEFAULT_LISTENER_NAMESPACE: &str = "actionListenerMiddleware";

/// Nested dispatch depth a store tolerates before refusing to go deeper.
pub const DEFAULT_MAX_DISPATCH_DEPTH: usize = 64;

/// Store-level settings, split out so the store crate does not need env access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub max_dispatch_depth: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_dispatch_depth: DEFAULT_MAX_DISPATCH_DEPTH,
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    // Listener middleware
    pub listener_namespace: String,

    // Store
    pub max_dispatch_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listener_namespace: DEFAULT_LISTENER_NAMESPACE.to_string(),
            max_dispatch_depth: DEFAULT_MAX_DISPATCH_DEPTH,
        }
    }
}

impl Config {
    /// Load configuration from environment variables. Every variable is optional.
    pub fn from_env() -> Result<Self, SwitchyardError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (env, a map in tests, ...).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SwitchyardError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listener_namespace = lookup("SWITCHYARD_LISTENER_NAMESPACE")
            .unwrap_or_else(|| DEFAULT_LISTENER_NAMESPACE.to_string());
        if listener_namespace.trim().is_empty() {
            return Err(SwitchyardError::Config(
                "SWITCHYARD_LISTENER_NAMESPACE must not be empty".to_string(),
            ));
        }

        let max_dispatch_depth = match lookup("SWITCHYARD_MAX_DISPATCH_DEPTH") {
            None => DEFAULT_MAX_DISPATCH_DEPTH,
            Some(raw) => parse_depth(&raw)?,
        };

        Ok(Self {
            listener_namespace,
            max_dispatch_depth,
        })
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            max_dispatch_depth: self.max_dispatch_depth,
        }
    }

    /// Log the effective configuration.
    pub fn log_summary(&self) {
        info!(
            listener_namespace = %self.listener_namespace,
            max_dispatch_depth = self.max_dispatch_depth,
            "Switchyard config loaded"
        );
    }
}

fn parse_depth(raw: &str) -> Result<usize, SwitchyardError> {
    match raw.trim().parse::<usize>() {
        Ok(0) | Err(_) => Err(SwitchyardError::Config(format!(
            "SWITCHYARD_MAX_DISPATCH_DEPTH must be a positive integer, got {raw:?}"
        ))),
        Ok(depth) => Ok(depth),
    }
}
