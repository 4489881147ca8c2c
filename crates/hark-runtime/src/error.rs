//! Runtime error types.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur while assembling or running a robot.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Loading or validating the configuration failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An `adapters.<name>` section does not fit the adapter's config type.
    #[error("Failed to deserialize config for adapter '{adapter}': {source}")]
    AdapterConfig {
        adapter: &'static str,
        #[source]
        source: figment::Error,
    },

    /// The adapter failed to start, run or close.
    #[error("Adapter error: {0}")]
    Adapter(#[from] hark_core::AdapterError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
