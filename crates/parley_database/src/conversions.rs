//! Conversions between conversation records and database rows.

use crate::{ConversationRow, DatabaseResult, NewConversationRow};
use parley_core::{ConversationId, ConversationRecord};
use parley_error::{PersistenceError, PersistenceErrorKind};

/// Build the insertable row for a record.
pub fn record_to_new_row(record: &ConversationRecord) -> DatabaseResult<NewConversationRow> {
    Ok(NewConversationRow {
        id: record.id.as_str().to_string(),
        user_id: record.user_id.clone(),
        title: record.title.clone(),
        path: record.path.clone(),
        messages: serde_json::to_value(&record.messages)?,
        created_at: record.created_at,
        updated_at: record.updated_at,
    })
}

/// Rebuild a record from a stored row.
pub fn row_to_record(row: ConversationRow) -> DatabaseResult<ConversationRecord> {
    let id = ConversationId::new(row.id).map_err(|e| {
        PersistenceError::new(PersistenceErrorKind::Serialization(e.to_string()))
    })?;

    Ok(ConversationRecord {
        id,
        user_id: row.user_id,
        title: row.title,
        path: row.path,
        messages: serde_json::from_value(row.messages)?,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}
