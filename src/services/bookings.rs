use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, instrument};
use uuid::Uuid;

use super::validation::validate_text;
use super::{ServiceError, ServiceResult};
use crate::database::models::{
    PaymentMethod, PaymentStatus, RequestStatus, Role, ServiceRequest, UserProfile,
};
use crate::database::repository::Repository;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequestInput {
    pub worker_id: Uuid,
    pub service_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub scheduled_time: String,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStats {
    pub total_users: usize,
    pub users_by_role: BTreeMap<String, usize>,
    pub total_workers: usize,
    pub verified_workers: usize,
    pub total_requests: usize,
    pub requests_by_status: BTreeMap<String, usize>,
    /// Sum of advance amounts over completed bookings.
    pub revenue: u64,
}

pub struct BookingService {
    repo: Arc<dyn Repository>,
    // Held across load-check-store so two updates of one booking cannot both win
    update_lock: Mutex<()>,
}

impl BookingService {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self {
            repo,
            update_lock: Mutex::new(()),
        }
    }

    #[instrument(skip(self, actor, input), fields(user_id = %actor.id, worker_id = %input.worker_id))]
    pub async fn create_request(&self, actor: &UserProfile, input: CreateRequestInput) -> ServiceResult<ServiceRequest> {
        if actor.role != Role::User {
            return Err(ServiceError::Forbidden("Only customers can book workers".to_string()));
        }
        validate_text("description", &input.description)?;

        let worker = self
            .repo
            .worker_by_id(input.worker_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Worker not found".to_string()))?;
        if !worker.offers(&input.service_type) {
            return Err(ServiceError::invalid_field(
                "serviceType",
                format!("{} does not offer '{}'", worker.name, input.service_type),
            ));
        }

        let request = ServiceRequest {
            id: Uuid::new_v4(),
            user_id: actor.id,
            user_name: actor.name.clone(),
            user_phone: actor.phone.clone(),
            user_email: actor.email.clone(),
            worker_id: worker.id,
            worker_name: worker.name.clone(),
            service_type: input.service_type,
            description: input.description.trim().to_string(),
            location: input.location.trim().to_string(),
            scheduled_time: input.scheduled_time.trim().to_string(),
            status: RequestStatus::Pending,
            payment_status: PaymentStatus::Pending,
            payment_method: input.payment_method,
            advance_amount: worker.advance_payment,
            total_amount: worker.hourly_rate,
            created_at: Utc::now(),
            updated_at: None,
            accepted_at: None,
            completed_at: None,
        };
        self.repo.create_request(&request).await?;
        info!(request_id = %request.id, "booking created");
        Ok(request)
    }

    pub async fn requests_for_user(&self, actor: &UserProfile) -> ServiceResult<Vec<ServiceRequest>> {
        Ok(self.repo.requests_for_user(actor.id).await?)
    }

    pub async fn requests_for_worker(&self, actor: &UserProfile) -> ServiceResult<Vec<ServiceRequest>> {
        if actor.role != Role::Worker {
            return Err(ServiceError::Forbidden("Only workers have assigned requests".to_string()));
        }
        Ok(self.repo.requests_for_worker(actor.id).await?)
    }

    pub async fn all_requests(&self) -> ServiceResult<Vec<ServiceRequest>> {
        Ok(self.repo.list_requests().await?)
    }

    /// The assigned worker moves a booking through its lifecycle.
    #[instrument(skip(self, actor), fields(actor_id = %actor.id))]
    pub async fn update_status(
        &self,
        actor: &UserProfile,
        request_id: Uuid,
        status: RequestStatus,
    ) -> ServiceResult<ServiceRequest> {
        let _guard = self.update_lock.lock().await;
        let mut request = self.load(request_id).await?;
        if request.worker_id != actor.id {
            return Err(ServiceError::Forbidden(
                "Only the assigned worker can change this request".to_string(),
            ));
        }
        let from = request.status;
        if !request.transition(status, Utc::now()) {
            return Err(ServiceError::Conflict(format!(
                "Cannot move request from {} to {}",
                from, status
            )));
        }
        self.repo.put_request(&request).await?;
        info!(%from, to = %status, "request status changed");
        Ok(request)
    }

    /// The booking customer records a payment step.
    #[instrument(skip(self, actor), fields(actor_id = %actor.id))]
    pub async fn update_payment(
        &self,
        actor: &UserProfile,
        request_id: Uuid,
        payment_status: PaymentStatus,
    ) -> ServiceResult<ServiceRequest> {
        let _guard = self.update_lock.lock().await;
        let mut request = self.load(request_id).await?;
        if request.user_id != actor.id {
            return Err(ServiceError::Forbidden(
                "Only the booking customer can pay for this request".to_string(),
            ));
        }
        let from = request.payment_status;
        if !request.record_payment(payment_status, Utc::now()) {
            return Err(ServiceError::Conflict(format!(
                "Cannot move payment from {} to {} on a {} request",
                from, payment_status, request.status
            )));
        }
        self.repo.put_request(&request).await?;
        info!(%from, to = %payment_status, "payment status changed");
        Ok(request)
    }

    pub async fn stats(&self) -> ServiceResult<PlatformStats> {
        let (users, workers, requests) = futures::try_join!(
            self.repo.list_users(),
            self.repo.list_workers(),
            self.repo.list_requests()
        )?;
        Ok(summarize(&users, workers.iter().filter(|w| w.verified).count(), workers.len(), &requests))
    }

    async fn load(&self, request_id: Uuid) -> ServiceResult<ServiceRequest> {
        self.repo
            .request_by_id(request_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Request not found".to_string()))
    }
}

fn summarize(users: &[UserProfile], verified_workers: usize, total_workers: usize, requests: &[ServiceRequest]) -> PlatformStats {
    let mut stats = PlatformStats {
        total_users: users.len(),
        total_workers,
        verified_workers,
        total_requests: requests.len(),
        ..Default::default()
    };
    for role in [Role::User, Role::Worker, Role::Admin] {
        stats.users_by_role.insert(role.to_string(), 0);
    }
    for user in users {
        *stats.users_by_role.entry(user.role.to_string()).or_default() += 1;
    }
    for status in [
        RequestStatus::Pending,
        RequestStatus::Accepted,
        RequestStatus::Rejected,
        RequestStatus::Completed,
    ] {
        stats.requests_by_status.insert(status.to_string(), 0);
    }
    for request in requests {
        *stats.requests_by_status.entry(request.status.to_string()).or_default() += 1;
        if request.status == RequestStatus::Completed {
            stats.revenue += u64::from(request.advance_amount);
        }
    }
    stats
}
