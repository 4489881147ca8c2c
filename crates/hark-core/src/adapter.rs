//! Adapter trait.
//!
//! Adapters connect a [`Robot`] to a concrete chat channel. The robot owns
//! exactly one adapter; the adapter never owns the robot. Instead the robot
//! passes itself into [`Adapter::run`] and [`Adapter::receive`], which keeps
//! ownership acyclic.
//!
//! # Architecture
//!
//! ```text
//! channel ──▶ Adapter::run ──▶ Adapter::receive ──▶ Robot::receive ──▶ listeners
//!    ▲                                                                      │
//!    └──────────── Adapter::send / reply / emote / topic / play ◀─ Response ┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! struct StdoutAdapter;
//!
//! #[async_trait]
//! impl Adapter for StdoutAdapter {
//!     async fn send(&self, _message: &Message, text: &str) -> AdapterResult<()> {
//!         println!("{text}");
//!         Ok(())
//!     }
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AdapterResult;
use crate::message::Message;
use crate::robot::{DispatchReport, Robot};

/// Lifecycle event emitted when an adapter's transport loop starts.
pub const CONNECTED: &str = "connected";

/// Lifecycle event emitted right before an adapter's transport loop returns.
pub const DISCONNECTED: &str = "disconnected";

/// A transport the robot talks through.
///
/// Every outbound operation is anchored to a [`Message`], which tells the
/// adapter which room and user the text is meant for. All operations have
/// defaults, so an adapter only implements what its channel supports.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Sends `text` to the room of `message`. Does nothing by default.
    async fn send(&self, _message: &Message, _text: &str) -> AdapterResult<()> {
        Ok(())
    }

    /// Emotes `text`. Delegates to [`send`](Self::send) by default.
    async fn emote(&self, message: &Message, text: &str) -> AdapterResult<()> {
        self.send(message, text).await
    }

    /// Replies to the sender of `message`.
    ///
    /// By default the sender's name is prefixed (`"<name>: <text>"`) and the
    /// result is passed to [`send`](Self::send). Messages without a user are
    /// sent unchanged.
    async fn reply(&self, message: &Message, text: &str) -> AdapterResult<()> {
        match message.user() {
            Some(user) => self.send(message, &format!("{}: {text}", user.name())).await,
            None => self.send(message, text).await,
        }
    }

    /// Sets the room topic. Does nothing by default.
    async fn topic(&self, _message: &Message, _text: &str) -> AdapterResult<()> {
        Ok(())
    }

    /// Plays a sound or media item. Does nothing by default.
    async fn play(&self, _message: &Message, _text: &str) -> AdapterResult<()> {
        Ok(())
    }

    /// Runs the transport loop until the channel ends.
    ///
    /// Implementations emit [`CONNECTED`] on entry, feed each inbound message
    /// to [`receive`](Self::receive), and emit [`DISCONNECTED`] before
    /// returning. The default returns immediately.
    async fn run(&self, _robot: &Robot) -> AdapterResult<()> {
        Ok(())
    }

    /// Releases transport resources. Does nothing by default.
    async fn close(&self) -> AdapterResult<()> {
        Ok(())
    }

    /// Hands a fully built message to the robot for dispatch.
    async fn receive(&self, robot: &Robot, message: Message) -> DispatchReport {
        robot.receive(message).await
    }
}

/// A shared adapter trait object.
pub type BoxedAdapter = Arc<dyn Adapter>;

/// Adapters that can be built from a configuration section.
///
/// Kept apart from [`Adapter`] so the latter stays object-safe.
pub trait ConfigurableAdapter: Adapter + Sized {
    /// The configuration type, deserialized from `adapters.<name>`.
    type Config: serde::de::DeserializeOwned + Default;

    /// Returns the adapter name used as the config key.
    fn name() -> &'static str;

    /// Creates an adapter instance from its configuration.
    fn from_config(config: Self::Config) -> AdapterResult<Self>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::User;
    use crate::testing::RecordingAdapter;

    #[tokio::test]
    async fn test_default_emote_delegates_to_send() {
        let adapter = RecordingAdapter::default();
        let msg = Message::new(None, "room");
        adapter.emote(&msg, "dances").await.unwrap();
        assert_eq!(adapter.sent_texts(), vec!["dances"]);
    }

    #[tokio::test]
    async fn test_default_reply_prefix() {
        let adapter = RecordingAdapter::default();
        let with_user = Message::new(Some(User::new("1", "bob")), "room");
        let without_user = Message::new(None, "room");

        adapter.reply(&with_user, "hi").await.unwrap();
        adapter.reply(&without_user, "hi").await.unwrap();
        assert_eq!(adapter.sent_texts(), vec!["bob: hi", "hi"]);
    }

    #[tokio::test]
    async fn test_bare_adapter_is_a_no_op() {
        struct Silent;
        impl Adapter for Silent {}

        let adapter = Silent;
        let msg = Message::new(None, "room");
        assert!(adapter.send(&msg, "x").await.is_ok());
        assert!(adapter.topic(&msg, "x").await.is_ok());
        assert!(adapter.play(&msg, "x").await.is_ok());
        assert!(adapter.close().await.is_ok());
    }
}
