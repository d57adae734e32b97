//! Inbound message value objects.
//!
//! A [`Message`] is what a transport hands to [`Robot::receive`]. It carries
//! the author, the room it was posted in and its raw text, plus a `finished`
//! flag that handler code can raise to stop further listener evaluation.
//!
//! [`Robot::receive`]: crate::Robot::receive

use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

/// The author of an inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Platform user identifier, used as `user_uid` on delivery.
    pub id: String,
    /// Display name, if the transport knows one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl User {
    /// Creates a user with the given identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// An inbound chat message.
///
/// # Example
///
/// ```rust
/// use nestor_core::{Message, User};
///
/// let message = Message::new("nestor ping")
///     .with_user(User::new("U123"))
///     .in_room("C456");
///
/// assert_eq!(message.room(), Some("C456"));
/// assert!(!message.is_finished());
/// ```
#[derive(Debug, Default)]
pub struct Message {
    user: Option<User>,
    room: Option<String>,
    text: String,
    finished: AtomicBool,
}

impl Message {
    /// Creates a message with the given text and no user or room.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Sets the author.
    pub fn with_user(mut self, user: User) -> Self {
        self.user = Some(user);
        self
    }

    /// Sets the room identifier.
    pub fn in_room(mut self, room: impl Into<String>) -> Self {
        self.room = Some(room.into());
        self
    }

    /// Returns the author, if any.
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Returns the room identifier, if any.
    pub fn room(&self) -> Option<&str> {
        self.room.as_deref()
    }

    /// Returns the raw text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Marks this message as finished.
    ///
    /// Returns `true` only for the call that actually flipped the flag.
    pub fn finish(&self) -> bool {
        !self.finished.swap(true, Ordering::AcqRel)
    }

    /// Returns whether [`finish`](Self::finish) has been called.
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let message = Message::new("hello")
            .with_user(User::new("U1").with_name("ada"))
            .in_room("C1");

        assert_eq!(message.text(), "hello");
        assert_eq!(message.user().map(|u| u.id.as_str()), Some("U1"));
        assert_eq!(message.user().and_then(|u| u.name.as_deref()), Some("ada"));
        assert_eq!(message.room(), Some("C1"));
    }

    #[test]
    fn test_finish_flips_once() {
        let message = Message::new("hello");
        assert!(!message.is_finished());
        assert!(message.finish());
        assert!(!message.finish());
        assert!(message.is_finished());
    }
}
