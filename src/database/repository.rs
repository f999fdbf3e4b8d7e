use async_trait::async_trait;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{ServiceCategory, ServiceRequest, StoredUser, UserProfile, WorkerProfile};

/// Persistence operations the booking services need.
///
/// Implemented both over a generic key-value store and over postgres
/// documents; callers cannot tell them apart.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Insert an account, plus its worker profile for workers.
    /// Fails with `Conflict` when the email is already registered.
    async fn create_user(&self, user: &StoredUser, worker: Option<&WorkerProfile>) -> Result<(), DatabaseError>;

    async fn user_by_email(&self, email: &str) -> Result<Option<StoredUser>, DatabaseError>;

    async fn user_by_id(&self, id: Uuid) -> Result<Option<StoredUser>, DatabaseError>;

    async fn list_users(&self) -> Result<Vec<UserProfile>, DatabaseError>;

    async fn worker_by_id(&self, id: Uuid) -> Result<Option<WorkerProfile>, DatabaseError>;

    async fn list_workers(&self) -> Result<Vec<WorkerProfile>, DatabaseError>;

    async fn workers_by_service(&self, service_id: &str) -> Result<Vec<WorkerProfile>, DatabaseError>;

    /// Overwrite an existing worker profile.
    async fn put_worker(&self, worker: &WorkerProfile) -> Result<(), DatabaseError>;

    async fn service_categories(&self) -> Result<Option<Vec<ServiceCategory>>, DatabaseError>;

    async fn put_service_categories(&self, categories: &[ServiceCategory]) -> Result<(), DatabaseError>;

    async fn create_request(&self, request: &ServiceRequest) -> Result<(), DatabaseError>;

    async fn request_by_id(&self, id: Uuid) -> Result<Option<ServiceRequest>, DatabaseError>;

    /// Overwrite an existing request.
    async fn put_request(&self, request: &ServiceRequest) -> Result<(), DatabaseError>;

    async fn requests_for_user(&self, user_id: Uuid) -> Result<Vec<ServiceRequest>, DatabaseError>;

    async fn requests_for_worker(&self, worker_id: Uuid) -> Result<Vec<ServiceRequest>, DatabaseError>;

    async fn list_requests(&self) -> Result<Vec<ServiceRequest>, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError>;
}
