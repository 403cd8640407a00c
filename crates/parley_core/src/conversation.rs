//! Conversation identity and the append-only message log.

use crate::{ChatMessage, Role};
use parley_error::{ParleyResult, ValidationError};
use serde::{Deserialize, Serialize};

/// Prefix of every response cache key.
pub const CACHE_KEY_PREFIX: &str = "conversation-";

/// Opaque conversation identifier.
///
/// # Examples
///
/// ```
/// use parley_core::ConversationId;
///
/// let id = ConversationId::new("abc123").unwrap();
/// assert_eq!(id.cache_key(), "conversation-abc123");
///
/// assert!(ConversationId::new("  ").is_err());
/// ```
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    /// Wrap an existing identifier. Blank identifiers are rejected.
    #[track_caller]
    pub fn new(id: impl Into<String>) -> ParleyResult<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            Err(ValidationError::new("conversationId must not be blank"))?
        }
        Ok(Self(id))
    }

    /// Fresh random identifier for a conversation the client has not named.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key of this conversation's response cache entry.
    pub fn cache_key(&self) -> String {
        format!("{}{}", CACHE_KEY_PREFIX, self.0)
    }
}

impl AsRef<str> for ConversationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// An ordered, append-only sequence of messages under one identifier.
///
/// # Examples
///
/// ```
/// use parley_core::{ChatMessage, Conversation, ConversationId};
///
/// let mut conversation = Conversation::new(
///     ConversationId::generate(),
///     Some("user-1".to_string()),
///     vec![ChatMessage::user("Hi")],
/// );
/// conversation.append(ChatMessage::assistant("Hello!"));
///
/// assert_eq!(conversation.messages().len(), 2);
/// assert_eq!(conversation.messages()[1].content(), "Hello!");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    id: ConversationId,
    user_id: Option<String>,
    messages: Vec<ChatMessage>,
}

impl Conversation {
    /// Start a conversation from its existing history.
    pub fn new(id: ConversationId, user_id: Option<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            id,
            user_id,
            messages,
        }
    }

    /// Add a message to the end of the conversation.
    pub fn append(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Conversation identifier.
    pub fn id(&self) -> &ConversationId {
        &self.id
    }

    /// Owning user, when known.
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Messages in order.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// First message the user wrote, if any.
    pub fn first_user_message(&self) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.role() == Role::User)
    }
}
