//! Response caching with TTL support.
//!
//! Completed replies are cached under `conversation-<id>` so that a repeated
//! request inside the TTL window is answered without calling the provider.

#![warn(missing_docs)]

mod cache;
mod service;

pub use cache::{CacheEntry, ResponseCache, ResponseCacheConfig, ResponseCacheConfigBuilder};
pub use service::ConversationCache;
