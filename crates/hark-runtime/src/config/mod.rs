//! Configuration for the Hark runtime.
//!
//! Layered loading (defaults, files, `HARK_*` environment) with figment,
//! followed by validation. The core crate never reads configuration; the
//! runtime turns a [`HarkConfig`] into a configured robot and adapter.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    DispatchConfig, HarkConfig, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig,
    RobotConfig, SpanEventConfig,
};
pub use validation::validate_config;
