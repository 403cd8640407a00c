//! Database rows for stored conversations.

use crate::schema::conversations;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// A stored conversation as read from the database.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = conversations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ConversationRow {
    pub id: String,
    pub user_id: Option<String>,
    pub title: String,
    pub path: String,
    pub messages: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Conversation for insertion.
#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = conversations)]
pub struct NewConversationRow {
    pub id: String,
    pub user_id: Option<String>,
    pub title: String,
    pub path: String,
    pub messages: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
