use sqlx::postgres::{PgPool, PgPoolOptions};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Type alias for the PostgreSQL connection pool
pub type DbPool = PgPool;

/// SQLSTATE raised by an exclusion constraint (overlapping confirmed stays)
const EXCLUSION_VIOLATION: &str = "23P01";
/// SQLSTATE raised by a unique index
const UNIQUE_VIOLATION: &str = "23505";

/// Failures of the persistence layer
///
/// Engines never interpret these as "empty" or "available"; they are always
/// propagated as a storage-unavailable condition unless the variant carries a
/// business meaning (uniqueness, exclusion).
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Unique constraint {constraint} violated")]
    Duplicate { constraint: String },

    #[error("Exclusion constraint {constraint} violated")]
    Exclusion { constraint: String },

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    /// True for a unique violation on the named constraint
    pub fn is_duplicate_of(&self, name: &str) -> bool {
        matches!(self, StorageError::Duplicate { constraint } if constraint == name)
    }
}

impl From<sqlx::Error> for StorageError {
    fn from(error: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_error) = &error {
            let constraint = db_error.constraint().unwrap_or_default().to_string();
            match db_error.code().as_deref() {
                Some(EXCLUSION_VIOLATION) => return StorageError::Exclusion { constraint },
                Some(UNIQUE_VIOLATION) => return StorageError::Duplicate { constraint },
                _ => {}
            }
        }
        StorageError::Database(error)
    }
}

/// Creates and configures a PostgreSQL connection pool
///
/// # Arguments
/// * `database_url` - PostgreSQL connection string
/// * `max_connections` - Upper bound on pooled connections
/// * `acquire_timeout` - How long a caller may wait for a free connection
pub async fn create_pool(
    database_url: &str,
    max_connections: u32,
    acquire_timeout: Duration,
) -> Result<DbPool, sqlx::Error> {
    tracing::debug!("Creating database connection pool");

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(acquire_timeout)
        .connect(database_url)
        .await?;

    tracing::info!("Database connection pool created successfully");
    Ok(pool)
}

/// Run a storage future with an upper bound on its duration
///
/// A call that does not finish in time fails with `StorageError::Timeout`
/// instead of hanging the request. Any open transaction inside the future is
/// dropped, which rolls it back.
pub async fn with_timeout<T, F>(limit: Duration, operation: F) -> Result<T, StorageError>
where
    F: Future<Output = Result<T, StorageError>>,
{
    match tokio::time::timeout(limit, operation).await {
        Ok(result) => {
            if let Err(ref error) = result {
                if !matches!(error, StorageError::Duplicate { .. } | StorageError::Exclusion { .. }) {
                    tracing::error!("Storage call failed: {}", error);
                }
            }
            result
        }
        Err(_) => {
            tracing::error!("Storage call exceeded {:?}", limit);
            Err(StorageError::Timeout(limit))
        }
    }
}
