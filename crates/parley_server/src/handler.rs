//! The chat request handler.

use crate::UserId;
use crate::recorder::{CompletedExchange, Recorder};
use crate::relay::{AbortReason, RelayOutcome, relay};
use parley_cache::ConversationCache;
use parley_core::{ChatMessage, ChatRequest, Conversation, ConversationId, ConversationRecord};
use parley_error::{ParleyResult, PersistenceError, PersistenceErrorKind, ValidationError};
use parley_interface::{CompletionProvider, CompletionRequest, ConversationStore, TokenStream};
use parley_models::ModelSelector;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::Instrument;

/// Where a reply's tokens come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReplySource {
    /// Replayed from the response cache
    Cache,
    /// Streamed live from the completion provider
    Provider,
}

impl ReplySource {
    /// Cache status as reported to clients.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cache => "hit",
            Self::Provider => "miss",
        }
    }
}

/// What happened after a live reply finished streaming.
#[derive(Debug)]
pub struct ExchangeOutcome {
    /// How the relay ended
    pub relay: RelayOutcome,
    /// Result of recording the exchange; `None` when the relay aborted
    pub recorded: Option<ParleyResult<ConversationRecord>>,
}

/// A reply ready to stream to the client.
pub struct ChatReply {
    /// Conversation the reply belongs to, generated when the client sent none
    pub conversation_id: ConversationId,
    /// Cache replay or live provider stream
    pub source: ReplySource,
    /// Reply tokens for the response body
    pub body: TokenStream,
    /// Resolves once the reply ended and, if it completed, was recorded.
    /// `None` for cache replays, which record nothing.
    pub completion: Option<JoinHandle<ExchangeOutcome>>,
}

impl std::fmt::Debug for ChatReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatReply")
            .field("conversation_id", &self.conversation_id)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// Answers chat requests from the cache or the completion provider.
#[derive(Clone)]
pub struct ChatService {
    provider: Arc<dyn CompletionProvider>,
    store: Arc<dyn ConversationStore>,
    recorder: Recorder,
    cache: ConversationCache,
    selector: ModelSelector,
    channel_capacity: usize,
}

impl std::fmt::Debug for ChatService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatService")
            .field("provider", &self.provider.provider_name())
            .field("selector", &self.selector)
            .field("channel_capacity", &self.channel_capacity)
            .finish_non_exhaustive()
    }
}

impl ChatService {
    /// Service answering from `provider`, recording into `store` and `cache`.
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        store: Arc<dyn ConversationStore>,
        cache: ConversationCache,
        selector: ModelSelector,
        channel_capacity: usize,
    ) -> Self {
        Self {
            provider,
            recorder: Recorder::new(store.clone(), cache.clone()),
            store,
            cache,
            selector,
            channel_capacity,
        }
    }

    /// The response cache this service reads and fills.
    pub fn cache(&self) -> &ConversationCache {
        &self.cache
    }

    /// Answer one chat request for `user`.
    ///
    /// Nothing is stored by this call itself. A live reply is recorded by the
    /// task behind [`ChatReply::completion`] once every token was forwarded.
    ///
    /// A request naming an existing conversation must belong to its owner
    /// and repeat the stored messages before adding new ones.
    ///
    /// # Errors
    ///
    /// - validation errors before the cache or provider is touched
    /// - not found when the conversation belongs to another user
    /// - validation error when the messages rewrite the stored history
    /// - provider rejections, with the provider's status and message
    #[tracing::instrument(
        skip(self, request, api_key_override),
        fields(user = %user, conversation_id = tracing::field::Empty, messages = request.messages.len())
    )]
    pub async fn handle(
        &self,
        user: &UserId,
        request: ChatRequest,
        api_key_override: Option<String>,
    ) -> ParleyResult<ChatReply> {
        request.validate()?;

        let named = request.conversation_id.is_some();
        let conversation_id = request
            .conversation_id
            .clone()
            .unwrap_or_else(ConversationId::generate);
        tracing::Span::current().record("conversation_id", tracing::field::display(&conversation_id));

        if let Some(entry) = self.cache.get_for_user(&conversation_id, user.as_str()) {
            tracing::debug!(tokens = entry.tokens().len(), "Replaying cached reply");
            let tokens = entry.tokens().clone();
            return Ok(ChatReply {
                conversation_id,
                source: ReplySource::Cache,
                body: Box::pin(futures_util::stream::iter(tokens.into_iter().map(Ok))),
                completion: None,
            });
        }

        let history = if named {
            self.stored_history(user, &conversation_id).await?
        } else {
            Vec::new()
        };
        if history.len() >= request.messages.len() || !request.messages.starts_with(&history) {
            return Err(ValidationError::new(
                "messages must repeat the stored conversation and add at least one new message",
            )
            .into());
        }
        let stored = history.len();

        let attachment = request.attachment();
        let model = self.selector.select(attachment.as_ref()).to_string();
        tracing::debug!(%model, provider = self.provider.provider_name(), "Requesting completion");

        let completion_request = CompletionRequest::new(model, request.messages.clone())
            .with_attachment(attachment)
            .with_api_key(api_key_override);
        let upstream = self.provider.stream_completion(&completion_request).await?;

        let (body, relay_handle) = relay(upstream, self.channel_capacity);
        let mut conversation = Conversation::new(
            conversation_id.clone(),
            Some(user.as_str().to_string()),
            history,
        );
        for message in request.messages.into_iter().skip(stored) {
            conversation.append(message);
        }
        let completion = tokio::spawn(
            settle(relay_handle, self.recorder.clone(), conversation).in_current_span(),
        );

        Ok(ChatReply {
            conversation_id,
            source: ReplySource::Provider,
            body,
            completion: Some(completion),
        })
    }
}

impl ChatService {
    /// Messages already stored for `id`, provided `user` owns them.
    async fn stored_history(
        &self,
        user: &UserId,
        id: &ConversationId,
    ) -> ParleyResult<Vec<ChatMessage>> {
        match self.store.load(id).await? {
            None => Ok(Vec::new()),
            Some(record) if record.is_owned_by(user.as_str()) => Ok(record.messages),
            Some(_) => {
                tracing::warn!("Conversation belongs to another user");
                Err(PersistenceError::new(PersistenceErrorKind::NotFound).into())
            }
        }
    }
}

/// Wait for the relay to end and record the exchange if it completed.
async fn settle(
    relay_handle: JoinHandle<RelayOutcome>,
    recorder: Recorder,
    conversation: Conversation,
) -> ExchangeOutcome {
    let relay = relay_handle.await.unwrap_or_else(|e| RelayOutcome::Aborted {
        reason: AbortReason::TaskFailed(e.to_string()),
        tokens_sent: 0,
    });

    let recorded = match &relay {
        RelayOutcome::Completed { tokens } => Some(
            recorder
                .record(CompletedExchange {
                    conversation,
                    tokens: tokens.clone(),
                })
                .await,
        ),
        RelayOutcome::Aborted { .. } => {
            tracing::info!("Reply did not complete, nothing recorded");
            None
        }
    };

    ExchangeOutcome { relay, recorded }
}
