//! Chat message type.

use crate::Role;
use serde::{Deserialize, Serialize};

/// A single message in a conversation.
///
/// Messages are immutable once built; a conversation changes only by
/// appending new ones.
///
/// # Examples
///
/// ```
/// use parley_core::{ChatMessage, Role};
///
/// let message = ChatMessage::user("Hello!");
/// assert_eq!(message.role(), Role::User);
/// assert_eq!(message.content(), "Hello!");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatMessage {
    role: Role,
    content: String,
}

impl ChatMessage {
    /// Create a message with an explicit role.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Author of the message.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Text of the message.
    pub fn content(&self) -> &str {
        &self.content
    }
}
