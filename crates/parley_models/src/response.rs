use serde::{Deserialize, Serialize};

/// Streaming chat completion chunk
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionChunk {
    /// Unique identifier
    #[serde(default)]
    pub id: Option<String>,
    /// Model used
    #[serde(default)]
    pub model: Option<String>,
    /// Delta choices
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

impl ChatCompletionChunk {
    /// Text carried by the first choice, if it carries any.
    pub fn token(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.delta.content.as_deref())
            .filter(|t| !t.is_empty())
    }
}

/// A choice in a streaming chunk
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ChunkChoice {
    /// Index of this choice
    #[serde(default)]
    pub index: u32,
    /// Delta content
    #[serde(default)]
    pub delta: Delta,
    /// Finish reason (if complete)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Delta content in a streaming chunk
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Delta {
    /// Role (only in first chunk)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Incremental content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Error document returned by the provider on failure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiErrorEnvelope {
    /// The error itself
    pub error: ApiErrorBody,
}

/// Provider error details
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiErrorBody {
    /// Human-readable message
    pub message: String,
    /// Error category (e.g., "invalid_request_error")
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Provider error code, string or number
    #[serde(default)]
    pub code: Option<serde_json::Value>,
}
