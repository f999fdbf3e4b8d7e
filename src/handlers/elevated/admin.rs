// handlers/elevated/admin.rs - platform oversight

use axum::extract::{
    rejection::{JsonRejection, PathRejection},
    Path, State,
};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::{ServiceRequest, UserProfile, WorkerProfile};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::PlatformStats;

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub verified: bool,
}

/// GET /api/admin/users
pub async fn users(State(state): State<AppState>) -> ApiResult<Vec<UserProfile>> {
    Ok(ApiResponse::success(state.services.accounts.all_users().await?))
}

/// GET /api/admin/workers
pub async fn workers(State(state): State<AppState>) -> ApiResult<Vec<WorkerProfile>> {
    Ok(ApiResponse::success(state.services.catalog.all_workers().await?))
}

/// PUT /api/admin/workers/:worker_id/verify
pub async fn verify_worker(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<VerifyRequest>, JsonRejection>,
) -> ApiResult<WorkerProfile> {
    let Path(worker_id) = path?;
    let Json(request) = body?;
    let worker = state
        .services
        .catalog
        .set_verified(worker_id, request.verified)
        .await?;
    Ok(ApiResponse::success(worker))
}

/// GET /api/admin/requests
pub async fn requests(State(state): State<AppState>) -> ApiResult<Vec<ServiceRequest>> {
    Ok(ApiResponse::success(state.services.bookings.all_requests().await?))
}

/// GET /api/admin/stats
pub async fn stats(State(state): State<AppState>) -> ApiResult<PlatformStats> {
    Ok(ApiResponse::success(state.services.bookings.stats().await?))
}
