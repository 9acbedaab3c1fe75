use std::env::VarError;
use std::num::ParseIntError;

use data_model_jat::db::{ConnectionPoolError, DbPool, establish_connection_pool};

/// Pool size used when DB_MAX_CONNECTIONS is unset.
pub const DEFAULT_MAX_CONNECTIONS: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum DbEnvError {
    #[error("DATABASE_URL must be set in .env file or present as an env var: {0}")]
    MissingDatabaseUrl(#[from] VarError),
    #[error("DB_MAX_CONNECTIONS must be a positive integer: {0}")]
    InvalidMaxConnections(#[from] ParseIntError),
    #[error("DB_MAX_CONNECTIONS must be a positive integer, got 0")]
    ZeroMaxConnections,
    #[error("Couldn't connect to the database: {0}")]
    Connection(#[from] ConnectionPoolError),
}

/// Uses the env vars DATABASE_URL and DB_MAX_CONNECTIONS to establish a database connection pool.
/// The job_applications table is created if it doesn't exist yet.
pub async fn get_db_pool() -> Result<DbPool, DbEnvError> {
    let database_url = get_database_url()?;
    let max_connections = parse_max_connections(std::env::var("DB_MAX_CONNECTIONS").ok())?;
    let pool = establish_connection_pool(&database_url, max_connections).await?;
    tracing::info!(max_connections, "connected to the database");
    Ok(pool)
}

/// Retrieves the value for the env var DATABASE_URL.
pub fn get_database_url() -> Result<String, VarError> {
    std::env::var("DATABASE_URL")
}

/// Parses the pool size, defaulting to [`DEFAULT_MAX_CONNECTIONS`] when unset or empty.
pub fn parse_max_connections(value: Option<String>) -> Result<usize, DbEnvError> {
    match value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(DEFAULT_MAX_CONNECTIONS),
        Some(v) => match v.parse::<usize>()? {
            0 => Err(DbEnvError::ZeroMaxConnections),
            n => Ok(n),
        },
    }
}
