//! Response cache implementation.

use derive_getters::Getters;
use parley_core::ConversationId;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::time::Instant;

/// Cache entry holding a completed reply as the token sequence it streamed as.
#[derive(Debug, Clone, Getters)]
pub struct CacheEntry {
    key: String,
    owner: Option<String>,
    tokens: Vec<String>,
    created_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() >= self.ttl
    }

    /// Time left before the entry goes stale.
    pub fn time_remaining(&self) -> Option<Duration> {
        self.ttl.checked_sub(self.created_at.elapsed())
    }

    /// The whole reply.
    pub fn content(&self) -> String {
        self.tokens.concat()
    }

    /// Whether the reply belongs to `user_id`'s conversation.
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner.as_deref() == Some(user_id)
    }
}

/// Configuration for the response cache.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Getters,
    derive_setters::Setters,
    derive_builder::Builder,
)]
#[setters(prefix = "with_")]
pub struct ResponseCacheConfig {
    /// TTL for cached replies (seconds)
    #[serde(default = "default_ttl")]
    #[builder(default = "default_ttl()")]
    default_ttl: u64,

    /// Maximum cache size (number of entries)
    #[serde(default = "default_max_size")]
    #[builder(default = "default_max_size()")]
    max_size: usize,

    /// Whether caching is enabled
    #[serde(default = "default_enabled")]
    #[builder(default = "default_enabled()")]
    enabled: bool,
}

fn default_ttl() -> u64 {
    600 // 10 minutes
}

fn default_max_size() -> usize {
    1000
}

fn default_enabled() -> bool {
    true
}

impl Default for ResponseCacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: default_ttl(),
            max_size: default_max_size(),
            enabled: default_enabled(),
        }
    }
}

/// TTL cache of completed replies, keyed by `conversation-<id>`.
///
/// Writes are last-write-wins and restart the entry's TTL. When full, the
/// least recently used entry is evicted.
///
/// # Example
///
/// ```
/// use parley_cache::{ResponseCache, ResponseCacheConfig};
/// use parley_core::ConversationId;
///
/// let mut cache = ResponseCache::new(ResponseCacheConfig::default());
/// let id = ConversationId::new("c1").unwrap();
///
/// cache.insert(&id, Some("alice"), vec!["Hel".to_string(), "lo!".to_string()]);
///
/// let entry = cache.get_for_user(&id, "alice").unwrap();
/// assert_eq!(entry.key(), "conversation-c1");
/// assert_eq!(entry.content(), "Hello!");
/// assert!(cache.get_for_user(&id, "mallory").is_none());
/// ```
pub struct ResponseCache {
    config: ResponseCacheConfig,
    entries: HashMap<String, CacheEntry>,
    access_order: VecDeque<String>,
}

impl ResponseCache {
    /// Create a new response cache with configuration.
    pub fn new(config: ResponseCacheConfig) -> Self {
        tracing::debug!(
            default_ttl = config.default_ttl,
            max_size = config.max_size,
            enabled = config.enabled,
            "Creating new ResponseCache"
        );
        Self {
            config,
            entries: HashMap::new(),
            access_order: VecDeque::new(),
        }
    }

    /// Configuration the cache was built with.
    pub fn config(&self) -> &ResponseCacheConfig {
        &self.config
    }

    /// Store the completed reply of a conversation, replacing any previous one.
    #[tracing::instrument(
        skip(self, owner, tokens),
        fields(
            conversation_id = %id,
            tokens = tokens.len(),
            cache_size = self.entries.len()
        )
    )]
    pub fn insert(&mut self, id: &ConversationId, owner: Option<&str>, tokens: Vec<String>) {
        if !self.config.enabled {
            tracing::debug!("Cache disabled, skipping insert");
            return;
        }

        let key = id.cache_key();
        let ttl = Duration::from_secs(self.config.default_ttl);

        if self.entries.len() >= self.config.max_size && !self.entries.contains_key(&key) {
            self.evict_lru();
        }

        self.touch(&key);

        tracing::debug!(
            replaced = self.entries.contains_key(&key),
            ttl = ?ttl,
            "Inserted entry into cache"
        );

        let entry = CacheEntry {
            key: key.clone(),
            owner: owner.map(str::to_string),
            tokens,
            created_at: Instant::now(),
            ttl,
        };
        self.entries.insert(key, entry);
    }

    /// Get the cached reply of a conversation.
    ///
    /// Returns None if:
    /// - Entry doesn't exist
    /// - Entry is expired (it is removed)
    /// - Cache is disabled
    #[tracing::instrument(
        skip(self),
        fields(conversation_id = %id, cache_size = self.entries.len())
    )]
    pub fn get(&mut self, id: &ConversationId) -> Option<CacheEntry> {
        if !self.config.enabled {
            tracing::debug!("Cache disabled, returning None");
            return None;
        }

        let key = id.cache_key();

        let entry = self.entries.get(&key)?;
        if entry.is_expired() {
            tracing::debug!("Cache entry expired, removing");
            self.remove_key(&key);
            return None;
        }
        let entry = entry.clone();

        self.touch(&key);

        tracing::debug!(time_remaining = ?entry.time_remaining(), "Cache hit");
        Some(entry)
    }

    /// Get the cached reply of a conversation on behalf of `user_id`.
    ///
    /// An entry owned by someone else is reported as a miss and left in place.
    pub fn get_for_user(&mut self, id: &ConversationId, user_id: &str) -> Option<CacheEntry> {
        let entry = self.get(id)?;
        if entry.is_owned_by(user_id) {
            Some(entry)
        } else {
            tracing::debug!(conversation_id = %id, "Cached reply belongs to another user");
            None
        }
    }

    /// Drop the cached reply of a conversation.
    pub fn invalidate(&mut self, id: &ConversationId) -> bool {
        self.remove_key(&id.cache_key())
    }

    /// Sweep expired entries, returning how many were dropped.
    pub fn cleanup_expired(&mut self) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.remove_key(key);
        }

        if !expired.is_empty() {
            tracing::info!(
                removed = expired.len(),
                remaining = self.entries.len(),
                "Swept expired replies"
            );
        }
        expired.len()
    }

    /// Drop every cached reply.
    pub fn clear(&mut self) {
        tracing::info!(cleared = self.entries.len(), "Clearing reply cache");
        self.entries.clear();
        self.access_order.clear();
    }

    /// Number of cached replies, expired ones included until swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Move `key` to the most recently used position.
    fn touch(&mut self, key: &str) {
        self.access_order.retain(|k| k != key);
        self.access_order.push_back(key.to_string());
    }

    fn remove_key(&mut self, key: &str) -> bool {
        self.access_order.retain(|k| k != key);
        self.entries.remove(key).is_some()
    }

    fn evict_lru(&mut self) {
        if let Some(key) = self.access_order.pop_front() {
            tracing::debug!(key = %key, "Evicting least recently used reply");
            self.entries.remove(&key);
        }
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(ResponseCacheConfig::default())
    }
}
