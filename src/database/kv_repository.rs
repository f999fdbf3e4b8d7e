use async_trait::async_trait;
use futures::future::try_join_all;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::database::kv::{KvStore, KvStoreExt};
use crate::database::manager::DatabaseError;
use crate::database::models::{
    normalize_email, ServiceCategory, ServiceRequest, StoredUser, UserProfile, WorkerProfile,
};
use crate::database::repository::Repository;

// Key layout
const USERS_INDEX: &str = "users:index";
const WORKERS_INDEX: &str = "workers:index";
const REQUEST_PREFIX: &str = "request:";
const SERVICE_CATEGORIES: &str = "services:categories";

fn user_key(id: Uuid) -> String {
    format!("user:{}", id)
}

fn user_email_key(email: &str) -> String {
    format!("user_email:{}", normalize_email(email))
}

fn worker_key(id: Uuid) -> String {
    format!("worker:{}", id)
}

fn request_key(id: Uuid) -> String {
    format!("{}{}", REQUEST_PREFIX, id)
}

fn user_requests_key(user_id: Uuid) -> String {
    format!("requests_by_user:{}", user_id)
}

fn worker_requests_key(worker_id: Uuid) -> String {
    format!("requests_by_worker:{}", worker_id)
}

/// Booking repository emulated on a key-value store with id-list index keys.
pub struct KvRepository<S> {
    store: S,
    // Serializes read-modify-write cycles on index keys within this process
    write_lock: Mutex<()>,
}

impl<S: KvStore> KvRepository<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    async fn index(&self, key: &str) -> Result<Vec<Uuid>, DatabaseError> {
        Ok(self.store.get_json::<Vec<Uuid>>(key).await?.unwrap_or_default())
    }

    /// Caller must hold `write_lock`.
    async fn push_index(&self, key: &str, id: Uuid) -> Result<(), DatabaseError> {
        let mut ids = self.index(key).await?;
        if !ids.contains(&id) {
            ids.push(id);
            self.store.set_json(key, &ids).await?;
        }
        Ok(())
    }

    /// Resolve an id index into records, skipping ids whose record is gone.
    async fn resolve<T, F>(&self, index_key: &str, record_key: F) -> Result<Vec<T>, DatabaseError>
    where
        T: DeserializeOwned + Send,
        F: Fn(Uuid) -> String,
    {
        let ids = self.index(index_key).await?;
        let keys: Vec<String> = ids.into_iter().map(record_key).collect();
        let records = try_join_all(keys.iter().map(|k| self.store.get_json::<T>(k))).await?;

        let total = records.len();
        let found: Vec<T> = records.into_iter().flatten().collect();
        if found.len() < total {
            warn!("Index '{}' has {} dangling ids", index_key, total - found.len());
        }
        Ok(found)
    }
}

#[async_trait]
impl<S: KvStore> Repository for KvRepository<S> {
    async fn create_user(&self, user: &StoredUser, worker: Option<&WorkerProfile>) -> Result<(), DatabaseError> {
        let _guard = self.write_lock.lock().await;

        let email_key = user_email_key(&user.profile.email);
        if self.store.get(&email_key).await?.is_some() {
            return Err(DatabaseError::Conflict(format!(
                "email '{}' is already registered",
                user.profile.email
            )));
        }

        let id = user.id();
        self.store.set_json(&user_key(id), user).await?;
        self.store.set_json(&email_key, &id).await?;

        if let Some(worker) = worker {
            self.store.set_json(&worker_key(worker.id), worker).await?;
            self.push_index(WORKERS_INDEX, worker.id).await?;
        }
        self.push_index(USERS_INDEX, id).await?;

        debug!("Stored user {} ({})", id, user.profile.role);
        Ok(())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<StoredUser>, DatabaseError> {
        match self.store.get_json::<Uuid>(&user_email_key(email)).await? {
            Some(id) => self.user_by_id(id).await,
            None => Ok(None),
        }
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<StoredUser>, DatabaseError> {
        self.store.get_json(&user_key(id)).await
    }

    async fn list_users(&self) -> Result<Vec<UserProfile>, DatabaseError> {
        let users: Vec<StoredUser> = self.resolve(USERS_INDEX, user_key).await?;
        Ok(users.into_iter().map(|u| u.profile).collect())
    }

    async fn worker_by_id(&self, id: Uuid) -> Result<Option<WorkerProfile>, DatabaseError> {
        self.store.get_json(&worker_key(id)).await
    }

    async fn list_workers(&self) -> Result<Vec<WorkerProfile>, DatabaseError> {
        self.resolve(WORKERS_INDEX, worker_key).await
    }

    async fn workers_by_service(&self, service_id: &str) -> Result<Vec<WorkerProfile>, DatabaseError> {
        // Linear scan; the store has no secondary indexes
        let workers = self.list_workers().await?;
        Ok(workers.into_iter().filter(|w| w.offers(service_id)).collect())
    }

    async fn put_worker(&self, worker: &WorkerProfile) -> Result<(), DatabaseError> {
        let key = worker_key(worker.id);
        if self.store.get(&key).await?.is_none() {
            return Err(DatabaseError::NotFound(format!("worker {}", worker.id)));
        }
        self.store.set_json(&key, worker).await
    }

    async fn service_categories(&self) -> Result<Option<Vec<ServiceCategory>>, DatabaseError> {
        self.store.get_json(SERVICE_CATEGORIES).await
    }

    async fn put_service_categories(&self, categories: &[ServiceCategory]) -> Result<(), DatabaseError> {
        self.store.set_json(SERVICE_CATEGORIES, &categories).await
    }

    async fn create_request(&self, request: &ServiceRequest) -> Result<(), DatabaseError> {
        let _guard = self.write_lock.lock().await;

        self.store.set_json(&request_key(request.id), request).await?;
        self.push_index(&user_requests_key(request.user_id), request.id).await?;
        self.push_index(&worker_requests_key(request.worker_id), request.id).await?;
        Ok(())
    }

    async fn request_by_id(&self, id: Uuid) -> Result<Option<ServiceRequest>, DatabaseError> {
        self.store.get_json(&request_key(id)).await
    }

    async fn put_request(&self, request: &ServiceRequest) -> Result<(), DatabaseError> {
        let key = request_key(request.id);
        if self.store.get(&key).await?.is_none() {
            return Err(DatabaseError::NotFound(format!("request {}", request.id)));
        }
        self.store.set_json(&key, request).await
    }

    async fn requests_for_user(&self, user_id: Uuid) -> Result<Vec<ServiceRequest>, DatabaseError> {
        self.resolve(&user_requests_key(user_id), request_key).await
    }

    async fn requests_for_worker(&self, worker_id: Uuid) -> Result<Vec<ServiceRequest>, DatabaseError> {
        self.resolve(&worker_requests_key(worker_id), request_key).await
    }

    async fn list_requests(&self) -> Result<Vec<ServiceRequest>, DatabaseError> {
        let entries = self.store.get_by_prefix(REQUEST_PREFIX).await?;
        let mut requests = entries
            .into_iter()
            .map(|(key, value)| {
                serde_json::from_value::<ServiceRequest>(value)
                    .map_err(|source| DatabaseError::Corrupt { key, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        requests.sort_by_key(|r| r.created_at);
        Ok(requests)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        self.store.health_check().await
    }
}
