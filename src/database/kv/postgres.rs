use async_trait::async_trait;
use serde_json::Value;
use sqlx::{types::Json, PgPool, Row};

use super::{like_prefix_pattern, KvStore};
use crate::database::manager::DatabaseError;

/// Key-value rows in a single `kv_store` table.
#[derive(Clone)]
pub struct PgKvStore {
    pool: PgPool,
}

impl PgKvStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the backing table if it does not exist yet.
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key   TEXT PRIMARY KEY,
                value JSONB NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl KvStore for PgKvStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, DatabaseError> {
        let row = sqlx::query("SELECT value FROM kv_store WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let Json(value): Json<Value> = row.try_get("value")?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value) VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value
            "#,
        )
        .bind(key)
        .bind(Json(value))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM kv_store WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_by_prefix(&self, prefix: &str) -> Result<Vec<(String, Value)>, DatabaseError> {
        let rows = sqlx::query("SELECT key, value FROM kv_store WHERE key LIKE $1 ORDER BY key")
            .bind(like_prefix_pattern(prefix))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| {
                let key: String = row.try_get("key")?;
                let Json(value): Json<Value> = row.try_get("value")?;
                Ok::<_, DatabaseError>((key, value))
            })
            .collect()
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
