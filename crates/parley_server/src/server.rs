//! Assembly of the running server from configuration.

use crate::{AppState, ChatService, ParleyConfig, resolver_from_settings};
use parley_cache::ConversationCache;
use parley_database::{InMemoryConversationStore, PostgresConversationStore};
use parley_error::{ParleyResult, PersistenceError, PersistenceErrorKind};
use parley_interface::{CompletionProvider, ConversationStore};
use parley_models::{ModelSelector, OpenAiClient};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Open the configured conversation store.
///
/// PostgreSQL when `database.url` is set, migrated on connect; memory otherwise.
#[tracing::instrument(skip(config), fields(pool_size = config.database.pool_size))]
pub async fn open_store(config: &ParleyConfig) -> ParleyResult<Arc<dyn ConversationStore>> {
    match config.database.url.clone() {
        Some(url) => {
            let pool_size = config.database.pool_size;
            let store = tokio::task::spawn_blocking(move || {
                PostgresConversationStore::connect(&url, pool_size)
            })
            .await
            .map_err(|e| PersistenceError::new(PersistenceErrorKind::TaskJoin(e.to_string())))??;
            tracing::info!("Using PostgreSQL conversation store");
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("No database configured, conversations are kept in memory only");
            Ok(Arc::new(InMemoryConversationStore::new()))
        }
    }
}

/// Build route state from configuration and an opened store.
pub fn build_state(
    config: &ParleyConfig,
    provider: Arc<dyn CompletionProvider>,
    store: Arc<dyn ConversationStore>,
    cache: ConversationCache,
) -> ParleyResult<AppState> {
    let identity = resolver_from_settings(&config.auth)?;
    let chat = ChatService::new(
        provider,
        store.clone(),
        cache,
        ModelSelector::from_config(&config.provider),
        config.server.channel_capacity,
    );
    Ok(AppState::new(chat, store, identity))
}

/// Build everything the router needs from configuration alone.
pub async fn build_from_config(config: &ParleyConfig) -> ParleyResult<(AppState, ConversationCache)> {
    if config.provider.api_key.is_none() {
        tracing::warn!("No provider API key configured, requests must send x-api-key");
    }
    let provider: Arc<dyn CompletionProvider> = Arc::new(OpenAiClient::new(config.provider.clone())?);
    let store = open_store(config).await?;
    let cache = ConversationCache::new(config.cache.policy());
    let state = build_state(config, provider, store, cache.clone())?;
    Ok((state, cache))
}

/// Periodically drop expired cache entries.
pub fn spawn_cache_sweeper(cache: ConversationCache, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = cache.cleanup_expired();
            if removed > 0 {
                tracing::debug!(removed, remaining = cache.len(), "Swept expired cache entries");
            }
        }
    })
}
