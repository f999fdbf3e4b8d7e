use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use super::auth::AuthUser;
use crate::app::AppState;
use crate::database::models::UserProfile;
use crate::error::ApiError;

/// The account behind the request, freshly loaded from storage.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub UserProfile);

/// Middleware that checks the token's account still exists and still has the
/// role the token was issued for.
pub async fn validate_user_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("JWT authentication required before user validation"))?;

    let stored = state.repo.user_by_id(auth_user.user_id).await?.ok_or_else(|| {
        tracing::warn!("User validation failed: account {} no longer exists", auth_user.user_id);
        ApiError::unauthorized("Account no longer exists")
    })?;

    if stored.profile.role != auth_user.role {
        tracing::warn!(
            "User validation failed: token role '{}' but account {} is '{}'",
            auth_user.role,
            auth_user.user_id,
            stored.profile.role
        );
        return Err(ApiError::unauthorized("Token no longer matches account; log in again"));
    }

    tracing::debug!("User validation successful: {} ({})", stored.profile.email, stored.profile.role);
    request.extensions_mut().insert(CurrentUser(stored.profile));

    Ok(next.run(request).await)
}
