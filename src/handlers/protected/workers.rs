// handlers/protected/workers.rs - worker self-service and ratings

use axum::extract::{
    rejection::{JsonRejection, PathRejection},
    Extension, Path, State,
};
use axum::Json;
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::{WorkerProfile, WorkerUpdate};
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services::catalog::RatingInput;

/// PUT /api/workers/me
pub async fn update_me(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    body: Result<Json<WorkerUpdate>, JsonRejection>,
) -> ApiResult<WorkerProfile> {
    let Json(update) = body?;
    let worker = state.services.catalog.update_own_worker(&user, update).await?;
    Ok(ApiResponse::success(worker))
}

/// POST /api/workers/:worker_id/rating
pub async fn rate(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<RatingInput>, JsonRejection>,
) -> ApiResult<WorkerProfile> {
    let Path(worker_id) = path?;
    let Json(input) = body?;
    let worker = state.services.catalog.rate_worker(&user, worker_id, input).await?;
    Ok(ApiResponse::success(worker))
}
