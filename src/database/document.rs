use async_trait::async_trait;
use serde::de::DeserializeOwned;
use sqlx::{postgres::PgRow, types::Json, PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    normalize_email, ServiceCategory, ServiceRequest, StoredUser, UserProfile, WorkerProfile,
};
use crate::database::repository::Repository;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id         UUID PRIMARY KEY,
        email      TEXT NOT NULL UNIQUE,
        role       TEXT NOT NULL,
        doc        JSONB NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS workers (
        id  UUID PRIMARY KEY REFERENCES users (id) ON DELETE CASCADE,
        doc JSONB NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS service_requests (
        id         UUID PRIMARY KEY,
        user_id    UUID NOT NULL,
        worker_id  UUID NOT NULL,
        doc        JSONB NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS service_requests_user_idx ON service_requests (user_id)",
    "CREATE INDEX IF NOT EXISTS service_requests_worker_idx ON service_requests (worker_id)",
    r#"
    CREATE TABLE IF NOT EXISTS documents (
        key TEXT PRIMARY KEY,
        doc JSONB NOT NULL
    )
    "#,
];

const SERVICE_CATEGORIES: &str = "services:categories";

/// Booking repository over postgres tables holding JSONB documents.
#[derive(Clone)]
pub struct PgDocumentRepository {
    pool: PgPool,
}

impl PgDocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create tables and indexes if they do not exist yet.
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        debug!("Document schema is up to date");
        Ok(())
    }

    fn decode<T: DeserializeOwned>(row: &PgRow) -> Result<T, DatabaseError> {
        let Json(doc): Json<serde_json::Value> = row.try_get("doc")?;
        Ok(serde_json::from_value(doc)?)
    }

    fn decode_all<T: DeserializeOwned>(rows: &[PgRow]) -> Result<Vec<T>, DatabaseError> {
        rows.iter().map(Self::decode).collect()
    }
}

#[async_trait]
impl Repository for PgDocumentRepository {
    async fn create_user(&self, user: &StoredUser, worker: Option<&WorkerProfile>) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO users (id, email, role, doc, created_at) VALUES ($1, $2, $3, $4, $5)")
            .bind(user.id())
            .bind(normalize_email(&user.profile.email))
            .bind(user.profile.role.as_str())
            .bind(Json(user))
            .bind(user.profile.created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DatabaseError::from_unique_violation(
                    e,
                    format!("email '{}' is already registered", user.profile.email),
                )
            })?;

        if let Some(worker) = worker {
            sqlx::query("INSERT INTO workers (id, doc) VALUES ($1, $2)")
                .bind(worker.id)
                .bind(Json(worker))
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<StoredUser>, DatabaseError> {
        let row = sqlx::query("SELECT doc FROM users WHERE email = $1")
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::decode).transpose()
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<StoredUser>, DatabaseError> {
        let row = sqlx::query("SELECT doc FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::decode).transpose()
    }

    async fn list_users(&self) -> Result<Vec<UserProfile>, DatabaseError> {
        let rows = sqlx::query("SELECT doc FROM users ORDER BY created_at")
            .fetch_all(&self.pool)
            .await?;
        let users: Vec<StoredUser> = Self::decode_all(&rows)?;
        Ok(users.into_iter().map(|u| u.profile).collect())
    }

    async fn worker_by_id(&self, id: Uuid) -> Result<Option<WorkerProfile>, DatabaseError> {
        let row = sqlx::query("SELECT doc FROM workers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::decode).transpose()
    }

    async fn list_workers(&self) -> Result<Vec<WorkerProfile>, DatabaseError> {
        let rows = sqlx::query("SELECT doc FROM workers ORDER BY doc->>'createdAt'")
            .fetch_all(&self.pool)
            .await?;
        Self::decode_all(&rows)
    }

    async fn workers_by_service(&self, service_id: &str) -> Result<Vec<WorkerProfile>, DatabaseError> {
        let rows = sqlx::query(
            "SELECT doc FROM workers WHERE doc->'serviceTypes' @> jsonb_build_array($1::text) ORDER BY doc->>'createdAt'",
        )
        .bind(service_id)
        .fetch_all(&self.pool)
        .await?;
        Self::decode_all(&rows)
    }

    async fn put_worker(&self, worker: &WorkerProfile) -> Result<(), DatabaseError> {
        let result = sqlx::query("UPDATE workers SET doc = $2 WHERE id = $1")
            .bind(worker.id)
            .bind(Json(worker))
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("worker {}", worker.id)));
        }
        Ok(())
    }

    async fn service_categories(&self) -> Result<Option<Vec<ServiceCategory>>, DatabaseError> {
        let row = sqlx::query("SELECT doc FROM documents WHERE key = $1")
            .bind(SERVICE_CATEGORIES)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::decode).transpose()
    }

    async fn put_service_categories(&self, categories: &[ServiceCategory]) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO documents (key, doc) VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET doc = EXCLUDED.doc
            "#,
        )
        .bind(SERVICE_CATEGORIES)
        .bind(Json(categories))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn create_request(&self, request: &ServiceRequest) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO service_requests (id, user_id, worker_id, doc, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(request.id)
        .bind(request.user_id)
        .bind(request.worker_id)
        .bind(Json(request))
        .bind(request.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_unique_violation(e, format!("request {} already exists", request.id)))?;
        Ok(())
    }

    async fn request_by_id(&self, id: Uuid) -> Result<Option<ServiceRequest>, DatabaseError> {
        let row = sqlx::query("SELECT doc FROM service_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::decode).transpose()
    }

    async fn put_request(&self, request: &ServiceRequest) -> Result<(), DatabaseError> {
        let result = sqlx::query("UPDATE service_requests SET doc = $2 WHERE id = $1")
            .bind(request.id)
            .bind(Json(request))
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("request {}", request.id)));
        }
        Ok(())
    }

    async fn requests_for_user(&self, user_id: Uuid) -> Result<Vec<ServiceRequest>, DatabaseError> {
        let rows = sqlx::query("SELECT doc FROM service_requests WHERE user_id = $1 ORDER BY created_at")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Self::decode_all(&rows)
    }

    async fn requests_for_worker(&self, worker_id: Uuid) -> Result<Vec<ServiceRequest>, DatabaseError> {
        let rows = sqlx::query("SELECT doc FROM service_requests WHERE worker_id = $1 ORDER BY created_at")
            .bind(worker_id)
            .fetch_all(&self.pool)
            .await?;
        Self::decode_all(&rows)
    }

    async fn list_requests(&self) -> Result<Vec<ServiceRequest>, DatabaseError> {
        let rows = sqlx::query("SELECT doc FROM service_requests ORDER BY created_at")
            .fetch_all(&self.pool)
            .await?;
        Self::decode_all(&rows)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
