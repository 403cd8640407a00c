//! PostgreSQL implementation of ConversationStore.

use crate::conversions::{record_to_new_row, row_to_record};
use crate::schema::conversations;
use crate::{ConversationRow, DatabaseResult, DbPool, establish_pool, run_migrations};

use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::upsert::excluded;
use parley_core::{ConversationId, ConversationRecord};
use parley_error::{ParleyResult, PersistenceError, PersistenceErrorKind};
use parley_interface::ConversationStore;

/// PostgreSQL implementation of ConversationStore using Diesel ORM.
///
/// Queries run on the blocking thread pool with a connection checked out of
/// an r2d2 pool, one checkout per call.
///
/// # Example
/// ```no_run
/// use parley_database::PostgresConversationStore;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = PostgresConversationStore::connect("postgres://localhost/parley", 8)?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct PostgresConversationStore {
    pool: DbPool,
}

impl std::fmt::Debug for PostgresConversationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresConversationStore")
            .field("connections", &self.pool.state().connections)
            .finish()
    }
}

impl PostgresConversationStore {
    /// Wrap an existing pool. Migrations are assumed to have run.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Open a pool for `database_url` and bring the schema up to date.
    #[tracing::instrument(skip(database_url))]
    pub fn connect(database_url: &str, max_size: u32) -> DatabaseResult<Self> {
        let pool = establish_pool(database_url, max_size)?;
        let mut conn = pool
            .get()
            .map_err(|e| PersistenceError::new(PersistenceErrorKind::Connection(e.to_string())))?;
        run_migrations(&mut *conn)?;
        Ok(Self::new(pool))
    }

    /// Run `op` against a pooled connection off the async runtime.
    async fn with_conn<T, F>(&self, op: F) -> ParleyResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> DatabaseResult<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        let result = tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(|e| {
                PersistenceError::new(PersistenceErrorKind::Connection(e.to_string()))
            })?;
            op(&mut *conn)
        })
        .await
        .map_err(|e| PersistenceError::new(PersistenceErrorKind::TaskJoin(e.to_string())))?;
        Ok(result?)
    }
}

#[async_trait]
impl ConversationStore for PostgresConversationStore {
    #[tracing::instrument(skip(self, record), fields(id = %record.id, messages = record.messages.len()))]
    async fn save(&self, record: &ConversationRecord) -> ParleyResult<()> {
        use diesel::query_dsl::methods::FilterDsl;

        let row = record_to_new_row(record)?;

        self.with_conn(move |conn| {
            conn.transaction::<_, PersistenceError, _>(|conn| {
                let written = diesel::insert_into(conversations::table)
                    .values(&row)
                    .on_conflict(conversations::id)
                    .do_update()
                    .set((
                        conversations::title.eq(excluded(conversations::title)),
                        conversations::path.eq(excluded(conversations::path)),
                        conversations::messages.eq(excluded(conversations::messages)),
                        conversations::updated_at.eq(excluded(conversations::updated_at)),
                    ))
                    .filter(
                        conversations::user_id
                            .is_not_distinct_from(excluded(conversations::user_id)),
                    )
                    .execute(conn)?;

                // No row written: the id exists under another owner
                if written == 0 {
                    return Err(PersistenceError::new(PersistenceErrorKind::NotFound));
                }
                Ok(())
            })
        })
        .await?;

        tracing::debug!("Saved conversation");
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    async fn load(&self, id: &ConversationId) -> ParleyResult<Option<ConversationRecord>> {
        let id = id.as_str().to_string();

        self.with_conn(move |conn| {
            conversations::table
                .find(id)
                .select(ConversationRow::as_select())
                .first::<ConversationRow>(conn)
                .optional()?
                .map(row_to_record)
                .transpose()
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn list_for_user(&self, user_id: &str) -> ParleyResult<Vec<ConversationRecord>> {
        let user_id = user_id.to_string();

        self.with_conn(move |conn| {
            conversations::table
                .filter(conversations::user_id.eq(user_id))
                .order(conversations::updated_at.desc())
                .select(ConversationRow::as_select())
                .load::<ConversationRow>(conn)?
                .into_iter()
                .map(row_to_record)
                .collect()
        })
        .await
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    async fn delete(&self, id: &ConversationId, user_id: &str) -> ParleyResult<bool> {
        let id = id.as_str().to_string();
        let user_id = user_id.to_string();

        let deleted = self
            .with_conn(move |conn| {
                let count = diesel::delete(
                    conversations::table
                        .filter(conversations::id.eq(id))
                        .filter(conversations::user_id.eq(user_id)),
                )
                .execute(conn)?;
                Ok(count)
            })
            .await?;

        tracing::debug!(deleted, "Deleted conversation rows");
        Ok(deleted > 0)
    }
}
