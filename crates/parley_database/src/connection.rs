//! Database connection utilities.

use crate::DatabaseResult;
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use parley_error::{PersistenceError, PersistenceErrorKind};

/// Pool of PostgreSQL connections.
pub type DbPool = Pool<ConnectionManager<PgConnection>>;

/// Build a connection pool for `database_url`.
///
/// # Errors
///
/// Returns an error if the pool cannot open its first connection.
#[tracing::instrument(skip(database_url))]
pub fn establish_pool(database_url: &str, max_size: u32) -> DatabaseResult<DbPool> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder()
        .max_size(max_size)
        .build(manager)
        .map_err(|e| PersistenceError::new(PersistenceErrorKind::Connection(e.to_string())))
}

/// Run pending migrations.
pub fn run_migrations(conn: &mut PgConnection) -> DatabaseResult<()> {
    use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

    const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| PersistenceError::new(PersistenceErrorKind::Migration(e.to_string())))?;
    tracing::info!(count = applied.len(), "Applied database migrations");
    Ok(())
}
