// handlers/public/services.rs - service catalogue and worker discovery

use axum::extract::{Path, State};

use crate::app::AppState;
use crate::database::models::{ServiceCategory, WorkerProfile};
use crate::middleware::{ApiResponse, ApiResult};

/// GET /api/services
pub async fn list_services(State(state): State<AppState>) -> ApiResult<Vec<ServiceCategory>> {
    Ok(ApiResponse::success(state.services.catalog.services().await?))
}

/// GET /api/services/:service_id/workers
pub async fn workers_for_service(
    State(state): State<AppState>,
    Path(service_id): Path<String>,
) -> ApiResult<Vec<WorkerProfile>> {
    let workers = state.services.catalog.workers_for(&service_id).await?;
    Ok(ApiResponse::success(workers))
}
