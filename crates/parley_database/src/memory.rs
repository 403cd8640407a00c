//! In-process conversation store.

use async_trait::async_trait;
use parley_core::{ConversationId, ConversationRecord};
use parley_error::{ParleyResult, PersistenceError, PersistenceErrorKind};
use parley_interface::ConversationStore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Conversation store backed by a map in memory.
///
/// Same upsert and ownership rules as the PostgreSQL store. Records live as
/// long as the process; clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryConversationStore {
    records: Arc<RwLock<HashMap<ConversationId, ConversationRecord>>>,
}

impl InMemoryConversationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored conversations.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether nothing has been stored.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    #[tracing::instrument(skip(self, record), fields(id = %record.id))]
    async fn save(&self, record: &ConversationRecord) -> ParleyResult<()> {
        let mut records = self.records.write().await;
        let mut record = record.clone();
        if let Some(existing) = records.get(&record.id) {
            if existing.user_id != record.user_id {
                tracing::warn!("Refusing to hand a conversation to another user");
                return Err(PersistenceError::new(PersistenceErrorKind::NotFound).into());
            }
            record.created_at = existing.created_at;
        }
        records.insert(record.id.clone(), record);
        Ok(())
    }

    async fn load(&self, id: &ConversationId) -> ParleyResult<Option<ConversationRecord>> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn list_for_user(&self, user_id: &str) -> ParleyResult<Vec<ConversationRecord>> {
        let mut owned: Vec<ConversationRecord> = self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.is_owned_by(user_id))
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(owned)
    }

    async fn delete(&self, id: &ConversationId, user_id: &str) -> ParleyResult<bool> {
        let mut records = self.records.write().await;
        match records.get(id) {
            Some(record) if record.is_owned_by(user_id) => {
                records.remove(id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
