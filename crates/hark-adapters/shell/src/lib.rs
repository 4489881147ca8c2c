//! # Hark Shell Adapter
//!
//! Runs a Hark robot in the terminal: every line typed becomes a message,
//! every reply is printed.
//!
//! ```text
//! Hark> ping
//! pong
//! Hark> hark: status
//! Shell: all good
//! Hark> quit
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hark_runtime::HarkRuntime;
//! use hark_adapter_shell::ShellAdapter;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = HarkRuntime::builder().build()?;
//!     let robot = runtime.create_robot::<ShellAdapter>()?;
//!     runtime.run(&robot).await?;
//!     Ok(())
//! }
//! ```

mod adapter;
pub mod config;

pub use adapter::ShellAdapter;
pub use config::ShellConfig;
