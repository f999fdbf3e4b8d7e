use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::validation::validate_text;
use super::{ServiceError, ServiceResult};
use crate::database::models::{
    default_categories, RequestStatus, Role, ServiceCategory, UserProfile, WorkerProfile, WorkerUpdate,
};
use crate::database::repository::Repository;

#[derive(Debug, Clone, Deserialize)]
pub struct RatingInput {
    pub rating: u8,
    #[serde(default)]
    pub review: Option<String>,
}

/// Service categories and worker profiles.
pub struct CatalogService {
    repo: Arc<dyn Repository>,
    // Serializes worker profile read-modify-write
    worker_lock: Mutex<()>,
}

impl CatalogService {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self {
            repo,
            worker_lock: Mutex::new(()),
        }
    }

    /// The catalogue; installs the default categories on first read.
    pub async fn services(&self) -> ServiceResult<Vec<ServiceCategory>> {
        if let Some(categories) = self.repo.service_categories().await? {
            return Ok(categories);
        }
        let categories = default_categories();
        self.repo.put_service_categories(&categories).await?;
        info!(count = categories.len(), "installed default service catalogue");
        Ok(categories)
    }

    pub async fn require_service(&self, service_id: &str) -> ServiceResult<ServiceCategory> {
        self.services()
            .await?
            .into_iter()
            .find(|c| c.id == service_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Service '{}' not found", service_id)))
    }

    #[instrument(skip(self))]
    pub async fn workers_for(&self, service_id: &str) -> ServiceResult<Vec<WorkerProfile>> {
        self.require_service(service_id).await?;
        let workers = self.repo.workers_by_service(service_id).await?;
        debug!(count = workers.len(), "workers offering service");
        Ok(workers)
    }

    pub async fn all_workers(&self) -> ServiceResult<Vec<WorkerProfile>> {
        Ok(self.repo.list_workers().await?)
    }

    pub async fn worker(&self, worker_id: Uuid) -> ServiceResult<WorkerProfile> {
        self.repo
            .worker_by_id(worker_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Worker not found".to_string()))
    }

    /// A worker edits their own profile.
    #[instrument(skip(self, actor, update), fields(worker_id = %actor.id))]
    pub async fn update_own_worker(&self, actor: &UserProfile, update: WorkerUpdate) -> ServiceResult<WorkerProfile> {
        if actor.role != Role::Worker {
            return Err(ServiceError::Forbidden("Only workers have a worker profile".to_string()));
        }
        if let Some(service_types) = &update.service_types {
            if service_types.is_empty() {
                return Err(ServiceError::invalid_field(
                    "serviceTypes",
                    "Workers must offer at least one service",
                ));
            }
            for service_type in service_types {
                self.require_service(service_type).await.map_err(|_| {
                    ServiceError::invalid_field("serviceTypes", format!("Unknown service '{}'", service_type))
                })?;
            }
        }
        for (field, value) in [("bio", &update.bio), ("experience", &update.experience)] {
            if let Some(value) = value {
                validate_text(field, value)?;
            }
        }

        let _guard = self.worker_lock.lock().await;
        let mut worker = self.worker(actor.id).await?;
        worker.apply(update);
        self.repo.put_worker(&worker).await?;
        info!("worker profile updated");
        Ok(worker)
    }

    #[instrument(skip(self))]
    pub async fn set_verified(&self, worker_id: Uuid, verified: bool) -> ServiceResult<WorkerProfile> {
        let _guard = self.worker_lock.lock().await;
        let mut worker = self.worker(worker_id).await?;
        worker.verified = verified;
        self.repo.put_worker(&worker).await?;
        info!("worker verification changed");
        Ok(worker)
    }

    /// Rate a worker after a completed booking with them.
    #[instrument(skip(self, actor, input), fields(user_id = %actor.id, rating = input.rating))]
    pub async fn rate_worker(&self, actor: &UserProfile, worker_id: Uuid, input: RatingInput) -> ServiceResult<WorkerProfile> {
        if !(1..=5).contains(&input.rating) {
            return Err(ServiceError::invalid_field("rating", "Rating must be between 1 and 5"));
        }
        if actor.id == worker_id {
            return Err(ServiceError::Forbidden("Workers cannot rate themselves".to_string()));
        }
        let review = input.review.map(|r| r.trim().to_string()).filter(|r| !r.is_empty());
        if let Some(review) = &review {
            validate_text("review", review)?;
        }

        let _guard = self.worker_lock.lock().await;
        let mut worker = self.worker(worker_id).await?;
        let completed = self
            .repo
            .requests_for_user(actor.id)
            .await?
            .iter()
            .any(|r| r.worker_id == worker_id && r.status == RequestStatus::Completed);
        if !completed {
            return Err(ServiceError::Forbidden(
                "You can only rate workers after a completed booking".to_string(),
            ));
        }

        worker.add_rating(actor.id, input.rating, review);
        self.repo.put_worker(&worker).await?;
        info!(average = worker.rating, total = worker.total_ratings, "worker rated");
        Ok(worker)
    }
}
