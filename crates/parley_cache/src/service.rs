//! Shareable cache handle passed to request handlers.

use crate::{CacheEntry, ResponseCache, ResponseCacheConfig};
use parking_lot::Mutex;
use parley_core::ConversationId;
use std::sync::Arc;

/// Cloneable handle to one [`ResponseCache`].
///
/// Every clone sees the same entries. Locks are held only for the duration
/// of a single lookup or write, never across an await.
#[derive(Clone, Default)]
pub struct ConversationCache {
    inner: Arc<Mutex<ResponseCache>>,
}

impl ConversationCache {
    /// Create a cache service with the given policy.
    pub fn new(config: ResponseCacheConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ResponseCache::new(config))),
        }
    }

    /// Fresh cached reply for a conversation.
    pub fn get(&self, id: &ConversationId) -> Option<CacheEntry> {
        self.inner.lock().get(id)
    }

    /// Fresh cached reply for a conversation owned by `user_id`.
    pub fn get_for_user(&self, id: &ConversationId, user_id: &str) -> Option<CacheEntry> {
        self.inner.lock().get_for_user(id, user_id)
    }

    /// Store or refresh the reply for a conversation.
    pub fn insert(&self, id: &ConversationId, owner: Option<&str>, tokens: Vec<String>) {
        self.inner.lock().insert(id, owner, tokens);
    }

    /// Drop the reply for a conversation.
    pub fn invalidate(&self, id: &ConversationId) -> bool {
        self.inner.lock().invalidate(id)
    }

    /// Remove expired entries, returning how many were dropped.
    pub fn cleanup_expired(&self) -> usize {
        self.inner.lock().cleanup_expired()
    }

    /// Number of entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

impl std::fmt::Debug for ConversationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationCache")
            .field("entries", &self.len())
            .finish()
    }
}
