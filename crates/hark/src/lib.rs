//! # Hark
//!
//! A minimal chat-bot runtime.
//!
//! ## Overview
//!
//! A [`Robot`](core::Robot) receives text messages through an adapter,
//! runs each one past every registered listener, and lets matching handlers
//! answer through the same adapter.
//!
//! ```text
//! ┌─────────────┐     ┌────────────┐     ┌──────────────────────────────┐
//! │   Adapter   │────▶│   Robot    │────▶│ hear("ping")     ─▶ handler  │
//! │   (shell)   │     │  receive   │────▶│ respond("status") ─▶ handler │
//! └─────────────┘     └────────────┘────▶│ listen(custom)   ─▶ handler  │
//!        ▲                               └──────────────┬───────────────┘
//!        └──────────────────── Response ◀───────────────┘
//! ```
//!
//! - **Core**: robot, listeners, matchers, responses, lifecycle events
//! - **Runtime**: layered configuration, logging, signal handling
//! - **Adapters**: transports (the terminal, with the `shell` feature)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hark::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = HarkRuntime::builder().build()?;
//!     let robot = runtime.create_robot::<ShellAdapter>()?;
//!
//!     robot.hear("ping", |res: Response| async move { res.send("pong").await })?;
//!
//!     runtime.run(&robot).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `shell` *(default)*: terminal adapter
//! - `toml-config` *(default)*: TOML configuration files
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output

pub use hark_core as core;
pub use hark_runtime as runtime;

#[cfg(feature = "shell")]
pub use hark_adapter_shell as shell;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use hark::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use hark_runtime::{HarkConfig, HarkRuntime, LoggingBuilder, RuntimeError};

    // Registration and dispatch
    pub use hark_core::{
        DispatchReport, EventData, EventHandler, ListenerId, ListenerOutcome, MatchResult,
        Matcher, Response, Robot,
    };

    // Matchers for `listen`
    pub use hark_core::{DirectMessageMatcher, RegexMatcher};

    // Lifecycle events
    pub use hark_core::{CONNECTED, DISCONNECTED};

    // Messages
    pub use hark_core::{Message, User};

    // Adapter authoring
    pub use hark_core::{Adapter, AdapterError, AdapterResult, ConfigurableAdapter, async_trait};

    #[cfg(feature = "shell")]
    pub use hark_adapter_shell::{ShellAdapter, ShellConfig};
}
