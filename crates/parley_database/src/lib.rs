//! Conversation persistence for Parley.
//!
//! Two [`parley_interface::ConversationStore`] implementations:
//!
//! - [`PostgresConversationStore`]: Diesel over an r2d2 pool, schema managed
//!   by embedded migrations
//! - [`InMemoryConversationStore`]: a process-local map for development and
//!   tests
//!
//! # Example
//!
//! ```rust,ignore
//! use parley_database::PostgresConversationStore;
//! use parley_interface::ConversationStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = PostgresConversationStore::connect(&std::env::var("DATABASE_URL")?, 8)?;
//! let mine = store.list_for_user("user-1").await?;
//! # Ok(())
//! # }
//! ```

mod connection;
mod conversions;
mod memory;
mod models;
mod repository;

pub mod schema;

pub use connection::{DbPool, establish_pool, run_migrations};
pub use conversions::{record_to_new_row, row_to_record};
pub use memory::InMemoryConversationStore;
pub use models::{ConversationRow, NewConversationRow};
pub use repository::PostgresConversationStore;

use parley_error::PersistenceError;

/// Result type for database operations.
pub type DatabaseResult<T> = Result<T, PersistenceError>;
