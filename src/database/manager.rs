use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::{AppConfig, StorageBackend};
use crate::database::document::PgDocumentRepository;
use crate::database::kv::{MemoryKvStore, PgKvStore};
use crate::database::kv_repository::KvRepository;
use crate::database::repository::Repository;

/// Errors from the storage layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Corrupt record at '{key}': {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Postgres unique_violation (23505) becomes a Conflict, everything else passes through.
    pub fn from_unique_violation(err: sqlx::Error, what: impl Into<String>) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some("23505") {
                return DatabaseError::Conflict(what.into());
            }
        }
        DatabaseError::Sqlx(err)
    }
}

/// Builds the configured repository backend.
pub struct DatabaseManager;

impl DatabaseManager {
    pub async fn connect(config: &AppConfig) -> Result<Arc<dyn Repository>, DatabaseError> {
        let storage = &config.storage;
        let repository: Arc<dyn Repository> = match storage.backend {
            StorageBackend::Memory => {
                info!("Using in-memory key-value storage");
                Arc::new(KvRepository::new(MemoryKvStore::new()))
            }
            StorageBackend::File => {
                info!("Using file-backed key-value storage at {}", storage.data_path.display());
                Arc::new(KvRepository::new(MemoryKvStore::open(&storage.data_path).await?))
            }
            StorageBackend::KvPostgres => {
                let pool = Self::pool(config).await?;
                let store = PgKvStore::new(pool);
                store.migrate().await?;
                info!("Using postgres key-value storage");
                Arc::new(KvRepository::new(store))
            }
            StorageBackend::Postgres => {
                let pool = Self::pool(config).await?;
                let repo = PgDocumentRepository::new(pool);
                repo.migrate().await?;
                info!("Using postgres document storage");
                Arc::new(repo)
            }
        };
        Ok(repository)
    }

    /// Open a connection pool sized from config
    pub async fn pool(config: &AppConfig) -> Result<PgPool, DatabaseError> {
        let url = config
            .storage
            .database_url
            .as_deref()
            .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.storage.max_connections)
            .acquire_timeout(Duration::from_secs(config.storage.connection_timeout))
            .connect(url)
            .await?;

        info!(
            "Created database pool for: {}",
            config.redacted_database_url().unwrap_or_default()
        );
        Ok(pool)
    }
}
