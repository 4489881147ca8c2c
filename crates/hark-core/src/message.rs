//! Users and messages.
//!
//! Both types are immutable once built. Transports create a fresh [`User`]
//! and [`Message`] for every unit of input; the robot synthesizes text-less
//! messages for outbound-only operations.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The sender of a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    id: String,
    name: String,
}

impl User {
    /// Creates a user from its transport-specific id and display name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Returns the opaque user identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the display name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// A message flowing through the robot.
///
/// Inbound messages carry text and usually an id. Outbound anchors built by
/// [`Message::new`] have neither.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    user: Option<User>,
    room: String,
    text: Option<String>,
    id: Option<String>,
}

impl Message {
    /// Creates a text-less message anchored to a room.
    pub fn new(user: Option<User>, room: impl Into<String>) -> Self {
        Self {
            user,
            room: room.into(),
            text: None,
            id: None,
        }
    }

    /// Creates an inbound text message.
    pub fn with_text(
        user: User,
        room: impl Into<String>,
        text: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        Self {
            user: Some(user),
            room: room.into(),
            text: Some(text.into()),
            id: Some(id.into()),
        }
    }

    /// Returns the sender, if any.
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Returns the room the message belongs to.
    pub fn room(&self) -> &str {
        &self.room
    }

    /// Returns the message text, if any.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Returns the transport message id, if any.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outbound_anchor_has_no_text() {
        let msg = Message::new(None, "general");
        assert_eq!(msg.room(), "general");
        assert!(msg.user().is_none());
        assert!(msg.text().is_none());
        assert!(msg.id().is_none());
    }

    #[test]
    fn test_text_message_accessors() {
        let msg = Message::with_text(User::new("7", "ann"), "shell", "hi there", "m-1");
        assert_eq!(msg.user().map(User::name), Some("ann"));
        assert_eq!(msg.text(), Some("hi there"));
        assert_eq!(msg.id(), Some("m-1"));
    }

    #[test]
    fn test_user_display() {
        assert_eq!(User::new("42", "Shell").to_string(), "Shell (42)");
    }
}
