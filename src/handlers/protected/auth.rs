// handlers/protected/auth.rs - GET /api/auth/whoami

use axum::extract::{Extension, State};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services::AccountView;

pub async fn whoami(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<AccountView> {
    Ok(ApiResponse::success(state.services.accounts.profile(user.id).await?))
}
