//! Hark Runtime - configuration, logging and process lifecycle.
//!
//! This crate provides:
//! - Layered configuration loading and validation ([`config`])
//! - Logging setup for every Hark crate ([`logging`])
//! - Robot assembly and signal-aware run loop ([`HarkRuntime`])
//!
//! ```rust,ignore
//! use hark_runtime::HarkRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = HarkRuntime::builder().build()?;
//!     let robot = runtime.create_robot::<MyAdapter>()?;
//!     runtime.run(&robot).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

pub use config::{ConfigError, ConfigLoader, ConfigResult, HarkConfig, Profile};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{HarkRuntime, RuntimeBuilder};

// Re-export tracing for use by bot scripts
pub use tracing;
pub use tracing_subscriber;

/// Logging macros for bot scripts.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
