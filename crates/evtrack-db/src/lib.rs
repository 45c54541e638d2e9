//! Postgres destination and CSV snapshot adapters for the charger sync.

use std::time::Duration;

use evtrack_core::{AppConfig, SinkError};
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;

pub mod sink;
pub mod snapshot;
pub mod table;

pub use sink::PgChargerSink;
pub use snapshot::{artifact_name, CsvSnapshotWriter};
pub use table::TableName;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_connections: config.db_max_connections,
            acquire_timeout_secs: config.db_acquire_timeout_secs,
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error("invalid table name {name:?}: {reason}")]
    InvalidTableName { name: String, reason: String },
}

impl DbError {
    /// Map onto the sink-level taxonomy for `destination`.
    #[must_use]
    pub fn into_sink_error(self, destination: &str) -> SinkError {
        match self {
            Self::InvalidTableName { name, reason } => SinkError::SchemaMismatch {
                destination: name,
                reason,
            },
            Self::Sqlx(e) => SinkError::Unavailable {
                destination: destination.to_owned(),
                reason: e.to_string(),
            },
        }
    }
}

/// Connect to a Postgres pool using explicit URL and config.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the connection cannot be established.
pub async fn connect_pool(database_url: &str, config: PoolConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(database_url)
        .await
}

/// Send a `SELECT 1` to verify the pool has a live connection.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await?;
    Ok(())
}
