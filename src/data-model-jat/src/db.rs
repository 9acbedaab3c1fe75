use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::deadpool::Pool;
use diesel_async::{AsyncPgConnection, SimpleAsyncConnection};

pub type PoolError = deadpool::managed::PoolError<diesel_async::pooled_connection::PoolError>;

pub type DbPool = Pool<AsyncPgConnection>;

/// DDL for the `job_applications` table. Every statement is idempotent.
const SCHEMA_SQL: &str = include_str!("../migrations/2024-01-01-000000_create_job_applications/up.sql");

#[derive(Debug, thiserror::Error)]
pub enum ConnectionPoolError {
    #[error("Failed to build connection pool: {0}")]
    BuildError(#[from] deadpool::managed::BuildError),
    #[error("Failed to establish initial database connection: {0}")]
    ConnectionError(#[from] PoolError),
    #[error("Failed to create the job_applications table: {0}")]
    SchemaError(#[from] diesel::result::Error),
}

/// Builds a pool of at most `max_size` connections without opening any of them.
pub fn build_connection_pool(database_url: &str, max_size: usize) -> Result<DbPool, ConnectionPoolError> {
    let config = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
    let pool = Pool::builder(config).max_size(max_size).build()?;
    Ok(pool)
}

/// Builds the pool, checks that the database is reachable and makes sure the schema exists.
pub async fn establish_connection_pool(database_url: &str, max_size: usize) -> Result<DbPool, ConnectionPoolError> {
    let pool = build_connection_pool(database_url, max_size)?;

    // Fail fast if the DB is unavailable
    let mut conn = pool.get().await?;
    ensure_schema(&mut conn).await?;

    Ok(pool)
}

/// Creates the `job_applications` table and its indexes if they don't exist yet.
pub async fn ensure_schema(conn: &mut AsyncPgConnection) -> Result<(), diesel::result::Error> {
    conn.batch_execute(SCHEMA_SQL).await?;
    tracing::debug!("job_applications schema is in place");
    Ok(())
}
