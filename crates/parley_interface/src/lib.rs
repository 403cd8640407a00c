//! Trait definitions for Parley.
//!
//! The server depends only on these seams: a [`CompletionProvider`] producing
//! a [`TokenStream`], and a [`ConversationStore`] persisting records.

mod traits;
mod types;

pub use traits::{CompletionProvider, ConversationStore};
pub use types::{CompletionRequest, TokenStream};
