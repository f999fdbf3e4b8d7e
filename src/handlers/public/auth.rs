// handlers/public/auth.rs - POST /auth/register, POST /auth/login

use axum::extract::{rejection::JsonRejection, State};
use axum::Json;
use serde::Deserialize;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{AccountView, LoginSession, RegisterInput};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /auth/register - create a customer, worker or (when enabled) admin account.
pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterInput>, JsonRejection>,
) -> ApiResult<AccountView> {
    let Json(input) = body?;
    let view = state.services.accounts.register(input).await?;
    Ok(ApiResponse::created(view))
}

/// POST /auth/login - exchange email and password for a bearer token.
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<LoginSession> {
    let Json(request) = body?;
    if request.email.trim().is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }
    let session = state
        .services
        .accounts
        .login(&request.email, &request.password)
        .await?;
    Ok(ApiResponse::success(session))
}
