//! Core conversation types for Parley.
//!
//! This crate holds the data model shared by every Parley component: messages
//! and their roles, append-only conversations, the inbound chat request, and
//! the persisted conversation record.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod conversation;
mod message;
mod record;
mod request;
mod role;

pub use conversation::{CACHE_KEY_PREFIX, Conversation, ConversationId};
pub use message::ChatMessage;
pub use record::{ConversationRecord, TITLE_MAX_CHARS, UNTITLED};
pub use request::{Attachment, ChatRequest, RequestData};
pub use role::Role;
