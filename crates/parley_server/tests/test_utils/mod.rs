//! Shared fixtures for server tests.
#![allow(dead_code)]

mod mock_provider;
mod stores;

pub use mock_provider::{MockBehavior, MockProvider};
pub use stores::{FailingStore, StaleReadStore};

use parley_cache::{ConversationCache, ResponseCacheConfig};
use parley_core::{ConversationId, ConversationRecord};
use parley_database::InMemoryConversationStore;
use parley_interface::ConversationStore;
use parley_models::{ModelSelector, OpenAiConfig};
use parley_server::{
    AuthMode, AuthSettings, CacheSettings, ChatService, DatabaseSettings, ParleyConfig,
    ServerSettings,
};
use std::sync::Arc;
use std::time::Duration;

pub const TEXT_MODEL: &str = "gpt-3.5-turbo";
pub const VISION_MODEL: &str = "gpt-4-vision-preview";
pub const JWT_SECRET: &str = "test-secret";

/// Configuration used by router tests.
pub fn test_config(mode: AuthMode) -> ParleyConfig {
    ParleyConfig {
        server: ServerSettings {
            bind_addr: "127.0.0.1:0".to_string(),
            channel_capacity: 4,
        },
        cache: CacheSettings {
            default_ttl: 600,
            max_size: 100,
            enabled: true,
            sweep_interval_secs: 60,
        },
        provider: OpenAiConfig::default().with_api_key("sk-test"),
        auth: AuthSettings {
            mode,
            jwt_secret: Some(JWT_SECRET.to_string()),
            user_header: "x-user-id".to_string(),
        },
        database: DatabaseSettings::default(),
    }
}

/// Cache with the default ten minute TTL.
pub fn test_cache() -> ConversationCache {
    ConversationCache::new(ResponseCacheConfig::default())
}

/// Chat service over the given provider, store and cache.
pub fn chat_service(
    provider: &MockProvider,
    store: Arc<dyn ConversationStore>,
    cache: ConversationCache,
) -> ChatService {
    ChatService::new(
        Arc::new(provider.clone()),
        store,
        cache,
        ModelSelector::new(TEXT_MODEL, VISION_MODEL),
        4,
    )
}

/// Wait until the background recorder has stored a conversation.
pub async fn wait_for_record(
    store: &InMemoryConversationStore,
    id: &ConversationId,
) -> anyhow::Result<ConversationRecord> {
    for _ in 0..200 {
        if let Some(record) = store.load(id).await? {
            return Ok(record);
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    anyhow::bail!("conversation {} was never recorded", id)
}

/// Wait until the background recorder has cached a reply.
pub async fn wait_for_cache(cache: &ConversationCache, id: &ConversationId) -> anyhow::Result<String> {
    for _ in 0..200 {
        if let Some(entry) = cache.get(id) {
            return Ok(entry.content());
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    anyhow::bail!("reply for {} was never cached", id)
}
