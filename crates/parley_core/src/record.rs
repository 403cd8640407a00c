//! Persisted conversation shape and the reducer that produces it.

use crate::{ChatMessage, Conversation, ConversationId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Longest title, in characters, taken from the first user message.
pub const TITLE_MAX_CHARS: usize = 100;

/// Title used when a conversation has no user message yet.
pub const UNTITLED: &str = "New conversation";

/// A conversation as stored durably and returned by the history API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRecord {
    /// Conversation identifier
    pub id: ConversationId,
    /// Owning user
    pub user_id: Option<String>,
    /// Short human-readable title
    pub title: String,
    /// Canonical client path of the conversation
    pub path: String,
    /// Full ordered message list
    pub messages: Vec<ChatMessage>,
    /// When the conversation was first stored
    pub created_at: DateTime<Utc>,
    /// When the conversation was last stored
    pub updated_at: DateTime<Utc>,
}

impl ConversationRecord {
    /// Fold a conversation into the fields that get persisted.
    ///
    /// Every field derives from the whole message sequence, not from its
    /// position in the request.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::Utc;
    /// use parley_core::{ChatMessage, Conversation, ConversationId, ConversationRecord};
    ///
    /// let id = ConversationId::new("c1").unwrap();
    /// let conversation = Conversation::new(
    ///     id,
    ///     Some("user-1".to_string()),
    ///     vec![
    ///         ChatMessage::system("Be brief."),
    ///         ChatMessage::user("  What is Rust?  "),
    ///         ChatMessage::assistant("A language."),
    ///     ],
    /// );
    ///
    /// let record = ConversationRecord::fold(&conversation, Utc::now());
    /// assert_eq!(record.title, "What is Rust?");
    /// assert_eq!(record.path, "/chat/c1");
    /// assert_eq!(record.messages.len(), 3);
    /// ```
    pub fn fold(conversation: &Conversation, now: DateTime<Utc>) -> Self {
        let title = conversation
            .first_user_message()
            .map(|m| m.content().trim())
            .filter(|t| !t.is_empty())
            .map(|t| t.chars().take(TITLE_MAX_CHARS).collect::<String>())
            .unwrap_or_else(|| UNTITLED.to_string());

        Self {
            id: conversation.id().clone(),
            user_id: conversation.user_id().map(str::to_string),
            title,
            path: Self::path_for(conversation.id()),
            messages: conversation.messages().to_vec(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Canonical client path for a conversation.
    pub fn path_for(id: &ConversationId) -> String {
        format!("/chat/{}", id)
    }

    /// Whether `user_id` owns this record.
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id.as_deref() == Some(user_id)
    }
}
