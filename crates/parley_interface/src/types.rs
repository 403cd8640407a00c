//! Core type definitions for the Parley interface.

use futures_util::stream::Stream;
use parley_core::{Attachment, ChatMessage};
use parley_error::ParleyResult;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// Ordered stream of reply tokens as the provider emits them.
pub type TokenStream = Pin<Box<dyn Stream<Item = ParleyResult<String>> + Send>>;

/// A streaming completion request handed to a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Model identifier to complete with
    pub model: String,
    /// Full message history, oldest first
    pub messages: Vec<ChatMessage>,
    /// Image the last user message refers to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
    /// Caller-supplied key replacing the configured one for this request
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl CompletionRequest {
    /// Request completing `messages` with `model`.
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            attachment: None,
            api_key: None,
        }
    }

    /// Attach an image reference.
    pub fn with_attachment(mut self, attachment: Option<Attachment>) -> Self {
        self.attachment = attachment;
        self
    }

    /// Override the provider key for this request.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }
}
