//! Inbound chat request and its validation.

use crate::{ChatMessage, ConversationId};
use parley_error::{ParleyResult, ValidationError};
use serde::{Deserialize, Serialize};

/// Extra request payload sent alongside the messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestData {
    /// Image the last user message refers to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Reference to an image attached to the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attachment {
    /// Location of the image
    pub image_url: String,
}

/// Body of `POST /api/chat`.
///
/// # Examples
///
/// ```
/// use parley_core::ChatRequest;
///
/// let body = br#"{"messages":[{"role":"user","content":"Hi"}]}"#;
/// let request = ChatRequest::from_json(body).unwrap();
/// assert!(request.validate().is_ok());
/// assert!(request.conversation_id.is_none());
///
/// let empty = ChatRequest::from_json(br#"{"messages":[]}"#).unwrap();
/// assert!(empty.validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// Conversation to continue; a new one is started when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<ConversationId>,
    /// Full message history, oldest first
    pub messages: Vec<ChatMessage>,
    /// Optional attachment payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<RequestData>,
}

impl ChatRequest {
    /// Request for a new conversation with the given history.
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            conversation_id: None,
            messages,
            data: None,
        }
    }

    /// Continue an existing conversation.
    pub fn with_conversation_id(mut self, id: ConversationId) -> Self {
        self.conversation_id = Some(id);
        self
    }

    /// Attach an image to the request.
    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.data = Some(RequestData {
            image_url: Some(url.into()),
        });
        self
    }

    /// Decode a request body. Unknown roles and malformed JSON are validation failures.
    #[track_caller]
    pub fn from_json(body: &[u8]) -> ParleyResult<Self> {
        serde_json::from_slice(body)
            .map_err(|e| ValidationError::new(format!("Malformed chat request: {}", e)).into())
    }

    /// Check the constraints decoding alone cannot express.
    #[track_caller]
    pub fn validate(&self) -> ParleyResult<()> {
        if self.messages.is_empty() {
            Err(ValidationError::new("messages must not be empty"))?
        }
        if let Some(id) = &self.conversation_id
            && id.as_str().trim().is_empty()
        {
            Err(ValidationError::new("conversationId must not be blank"))?
        }
        if let Some(url) = self.data.as_ref().and_then(|d| d.image_url.as_deref())
            && url.trim().is_empty()
        {
            Err(ValidationError::new("data.imageUrl must not be blank"))?
        }
        Ok(())
    }

    /// Attachment reference, when the request carries one.
    pub fn attachment(&self) -> Option<Attachment> {
        self.data
            .as_ref()
            .and_then(|d| d.image_url.clone())
            .map(|image_url| Attachment { image_url })
    }
}
