//! Trait definitions for completion providers and conversation stores.

use crate::{CompletionRequest, TokenStream};
use async_trait::async_trait;
use parley_core::{ConversationId, ConversationRecord};
use parley_error::ParleyResult;

/// A service that turns a message history into a streamed reply.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Start a streaming completion.
    ///
    /// Errors returned here happen before any token exists (rejections,
    /// transport failures). Errors inside the stream happen after tokens may
    /// already have been produced.
    async fn stream_completion(&self, req: &CompletionRequest) -> ParleyResult<TokenStream>;

    /// Provider name (e.g., "openai").
    fn provider_name(&self) -> &'static str;
}

/// Durable storage for conversation records.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Insert or update a record by id.
    ///
    /// An existing record keeps its `created_at`; every other field is replaced.
    async fn save(&self, record: &ConversationRecord) -> ParleyResult<()>;

    /// Load a record by id.
    async fn load(&self, id: &ConversationId) -> ParleyResult<Option<ConversationRecord>>;

    /// All records owned by `user_id`, most recently updated first.
    async fn list_for_user(&self, user_id: &str) -> ParleyResult<Vec<ConversationRecord>>;

    /// Delete a record owned by `user_id`. Returns whether anything was deleted.
    async fn delete(&self, id: &ConversationId, user_id: &str) -> ParleyResult<bool>;
}
