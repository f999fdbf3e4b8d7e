use axum::{extract::Request, middleware::Next, response::Response};

use super::validate_user::CurrentUser;
use crate::database::models::Role;
use crate::error::ApiError;

/// Runs after user validation; lets only admins through.
pub async fn require_admin_middleware(request: Request, next: Next) -> Result<Response, ApiError> {
    let CurrentUser(user) = request
        .extensions()
        .get::<CurrentUser>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if user.role != Role::Admin {
        tracing::warn!("Admin route refused for {} ({})", user.email, user.role);
        return Err(ApiError::forbidden("Admin access required"));
    }

    Ok(next.run(request).await)
}
