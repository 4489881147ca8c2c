//! # Hark Core
//!
//! The dispatch engine of the Hark chat-bot runtime.
//!
//! This crate has no knowledge of any concrete chat network. It receives a
//! fully formed [`Adapter`] and a robot name, and provides:
//!
//! - **Matching**: [`Matcher`] trait with [`RegexMatcher`] and the
//!   [`DirectMessageMatcher`] decorator
//! - **Listeners**: matcher + async handler pairs, tried in registration order
//! - **Responses**: per-match handles that talk back through the adapter
//! - **Lifecycle events**: the [`EventBus`] (`"connected"`, `"disconnected"`)
//! - **Orchestration**: the [`Robot`], which owns all of the above
//!
//! ## Message Flow
//!
//! ```text
//! ┌─────────────┐     ┌────────────┐     ┌──────────────────────┐
//! │   Adapter   │────▶│   Robot    │────▶│ Listener 0 ─▶ handler │
//! │ (transport) │     │  receive   │────▶│ Listener 1 ─▶ handler │
//! └─────────────┘     └────────────┘────▶│ Listener n ─▶ handler │
//!        ▲                               └──────────┬───────────┘
//!        └───────────────── Response ◀──────────────┘
//! ```
//!
//! Every listener sees every message; a failing handler is logged and
//! reported in the [`DispatchReport`] without affecting the others.

pub mod adapter;
pub mod bus;
pub mod error;
pub mod handler;
pub mod listener;
pub mod matcher;
pub mod message;
pub mod response;
pub mod robot;

#[cfg(test)]
mod testing;

pub use adapter::{Adapter, BoxedAdapter, CONNECTED, ConfigurableAdapter, DISCONNECTED};
pub use bus::{EventBus, EventData, EventHandler, PublishOutcome};
pub use error::{
    AdapterError, AdapterResult, BoxError, BusError, BusResult, CoreError, CoreResult,
    HandlerError,
};
pub use handler::{BoxedHandler, HandlerResult, IntoHandlerResult, into_handler};
pub use listener::{Listener, ListenerId, ListenerOutcome};
pub use matcher::{BoxedMatcher, DirectMessageMatcher, MatchResult, Matcher, RegexMatcher};
pub use message::{Message, User};
pub use response::Response;
pub use robot::{DispatchReport, Robot};

/// Re-exported so adapter crates implement [`Adapter`] with the same macro.
pub use async_trait::async_trait;
