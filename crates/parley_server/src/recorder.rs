//! Side effects of a completed exchange.

use chrono::Utc;
use parley_cache::ConversationCache;
use parley_core::{ChatMessage, Conversation, ConversationRecord};
use parley_error::{ParleyError, ParleyErrorKind, ParleyResult, PersistenceErrorKind};
use parley_interface::ConversationStore;
use std::sync::Arc;

/// A conversation whose reply streamed to the client in full.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedExchange {
    /// The conversation as the client sent it
    pub conversation: Conversation,
    /// Reply tokens in the order they were forwarded
    pub tokens: Vec<String>,
}

/// Persists finished exchanges and refreshes the response cache.
#[derive(Clone)]
pub struct Recorder {
    store: Arc<dyn ConversationStore>,
    cache: ConversationCache,
}

impl std::fmt::Debug for Recorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recorder")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl Recorder {
    /// Recorder writing to `store` and `cache`.
    pub fn new(store: Arc<dyn ConversationStore>, cache: ConversationCache) -> Self {
        Self { store, cache }
    }

    /// Append the reply, upsert the conversation, then cache the reply.
    ///
    /// The cache is written even when the upsert fails, unless the store
    /// reports the conversation as owned by someone else. The upsert error is
    /// logged and returned.
    #[tracing::instrument(
        skip_all,
        fields(conversation_id = %exchange.conversation.id(), tokens = exchange.tokens.len())
    )]
    pub async fn record(&self, exchange: CompletedExchange) -> ParleyResult<ConversationRecord> {
        let CompletedExchange {
            mut conversation,
            tokens,
        } = exchange;

        conversation.append(ChatMessage::assistant(tokens.concat()));
        let record = ConversationRecord::fold(&conversation, Utc::now());

        let persisted = self.store.save(&record).await;
        match &persisted {
            Err(e) if is_not_found(e) => {
                // Another user owns the id; their cached reply stays
                tracing::warn!(error = %e, "Conversation owned elsewhere, not recorded");
                return persisted.map(|()| record);
            }
            Err(e) => tracing::error!(error = %e, "Failed to persist conversation"),
            Ok(()) => {}
        }

        self.cache.insert(conversation.id(), conversation.user_id(), tokens);
        tracing::debug!(title = %record.title, "Recorded exchange");

        persisted.map(|()| record)
    }
}

fn is_not_found(error: &ParleyError) -> bool {
    matches!(
        error.kind(),
        ParleyErrorKind::Persistence(e) if e.kind == PersistenceErrorKind::NotFound
    )
}
