// handlers/protected/requests.rs - booking creation and lifecycle

use axum::extract::{
    rejection::{JsonRejection, PathRejection},
    Extension, Path, State,
};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::{PaymentStatus, RequestStatus, ServiceRequest};
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services::CreateRequestInput;

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: RequestStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentUpdate {
    pub payment_status: PaymentStatus,
}

/// POST /api/requests
pub async fn create(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    body: Result<Json<CreateRequestInput>, JsonRejection>,
) -> ApiResult<ServiceRequest> {
    let Json(input) = body?;
    let request = state.services.bookings.create_request(&user, input).await?;
    Ok(ApiResponse::created(request))
}

/// GET /api/requests/mine
pub async fn mine(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Vec<ServiceRequest>> {
    Ok(ApiResponse::success(state.services.bookings.requests_for_user(&user).await?))
}

/// GET /api/requests/assigned
pub async fn assigned(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Vec<ServiceRequest>> {
    Ok(ApiResponse::success(state.services.bookings.requests_for_worker(&user).await?))
}

/// PUT /api/requests/:request_id/status
pub async fn update_status(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<StatusUpdate>, JsonRejection>,
) -> ApiResult<ServiceRequest> {
    let Path(request_id) = path?;
    let Json(update) = body?;
    let request = state
        .services
        .bookings
        .update_status(&user, request_id, update.status)
        .await?;
    Ok(ApiResponse::success(request))
}

/// PUT /api/requests/:request_id/payment
pub async fn update_payment(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<PaymentUpdate>, JsonRejection>,
) -> ApiResult<ServiceRequest> {
    let Path(request_id) = path?;
    let Json(update) = body?;
    let request = state
        .services
        .bookings
        .update_payment(&user, request_id, update.payment_status)
        .await?;
    Ok(ApiResponse::success(request))
}
