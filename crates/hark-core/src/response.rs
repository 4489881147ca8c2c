//! The per-match handle given to handlers.

use std::sync::Arc;

use crate::error::AdapterResult;
use crate::matcher::MatchResult;
use crate::message::Message;
use crate::robot::Robot;

/// A handle bound to one message and the match it produced.
///
/// Every outbound call is anchored to the originating message and forwarded
/// to the robot's adapter, so a reply lands in the same room, addressed to
/// the same user.
#[derive(Clone)]
pub struct Response {
    robot: Robot,
    message: Arc<Message>,
    matched: MatchResult,
}

impl Response {
    pub(crate) fn new(robot: Robot, message: Arc<Message>, matched: MatchResult) -> Self {
        Self {
            robot,
            message,
            matched,
        }
    }

    /// Returns the robot that dispatched this response.
    pub fn robot(&self) -> &Robot {
        &self.robot
    }

    /// Returns the triggering message.
    pub fn message(&self) -> &Message {
        &self.message
    }

    /// Returns the full match result.
    pub fn matched(&self) -> &MatchResult {
        &self.matched
    }

    /// Shorthand for `matched().group(index)`.
    pub fn group(&self, index: usize) -> Option<&str> {
        self.matched.group(index)
    }

    /// Shorthand for `matched().named(name)`.
    pub fn named(&self, name: &str) -> Option<&str> {
        self.matched.named(name)
    }

    /// Sends `text` to the message's room.
    pub async fn send(&self, text: &str) -> AdapterResult<()> {
        self.robot.adapter().send(&self.message, text).await
    }

    /// Emotes `text` in the message's room.
    pub async fn emote(&self, text: &str) -> AdapterResult<()> {
        self.robot.adapter().emote(&self.message, text).await
    }

    /// Replies to the message's sender.
    pub async fn reply(&self, text: &str) -> AdapterResult<()> {
        self.robot.adapter().reply(&self.message, text).await
    }

    /// Sets the topic of the message's room.
    pub async fn topic(&self, text: &str) -> AdapterResult<()> {
        self.robot.adapter().topic(&self.message, text).await
    }

    /// Plays a sound or media item in the message's room.
    pub async fn play(&self, text: &str) -> AdapterResult<()> {
        self.robot.adapter().play(&self.message, text).await
    }
}

impl std::fmt::Debug for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Response")
            .field("robot", &self.robot.name())
            .field("message", &self.message)
            .field("matched", &self.matched)
            .finish()
    }
}
