//! Conversation stores with scripted failures.

use async_trait::async_trait;
use parley_core::{ConversationId, ConversationRecord};
use parley_database::InMemoryConversationStore;
use parley_error::{ParleyResult, PersistenceError, PersistenceErrorKind};
use parley_interface::ConversationStore;

/// Store whose writes always fail.
#[derive(Debug, Clone, Default)]
pub struct FailingStore;

#[async_trait]
impl ConversationStore for FailingStore {
    async fn save(&self, _record: &ConversationRecord) -> ParleyResult<()> {
        Err(PersistenceError::new(PersistenceErrorKind::Connection(
            "database unavailable".to_string(),
        ))
        .into())
    }

    async fn load(&self, _id: &ConversationId) -> ParleyResult<Option<ConversationRecord>> {
        Ok(None)
    }

    async fn list_for_user(&self, _user_id: &str) -> ParleyResult<Vec<ConversationRecord>> {
        Ok(Vec::new())
    }

    async fn delete(&self, _id: &ConversationId, _user_id: &str) -> ParleyResult<bool> {
        Ok(false)
    }
}

/// In-memory store whose reads never see earlier writes, as if a concurrent
/// writer landed between a request's read and its write.
#[derive(Debug, Clone, Default)]
pub struct StaleReadStore {
    pub inner: InMemoryConversationStore,
}

#[async_trait]
impl ConversationStore for StaleReadStore {
    async fn save(&self, record: &ConversationRecord) -> ParleyResult<()> {
        self.inner.save(record).await
    }

    async fn load(&self, _id: &ConversationId) -> ParleyResult<Option<ConversationRecord>> {
        Ok(None)
    }

    async fn list_for_user(&self, user_id: &str) -> ParleyResult<Vec<ConversationRecord>> {
        self.inner.list_for_user(user_id).await
    }

    async fn delete(&self, id: &ConversationId, user_id: &str) -> ParleyResult<bool> {
        self.inner.delete(id, user_id).await
    }
}
