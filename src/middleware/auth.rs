use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::{validate_jwt, Claims};
use crate::database::models::Role;
use crate::error::ApiError;

/// Identity asserted by a valid bearer token, before it is checked against storage.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            role: claims.role,
        }
    }
}

/// JWT authentication middleware that validates tokens and extracts user context
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(&headers).map_err(ApiError::unauthorized)?;

    let claims = validate_jwt(token, &state.config.security.jwt_secret).map_err(|e| {
        tracing::debug!("Rejected bearer token: {}", e);
        ApiError::unauthorized("Invalid or expired token")
    })?;

    request.extensions_mut().insert(AuthUser::from(claims));
    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<&str, &'static str> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or("Missing Authorization header")?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format")?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        Some(_) => Err("Empty JWT token"),
        None => Err("Authorization header must use Bearer token format"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_token_is_extracted() {
        assert_eq!(extract_jwt_from_headers(&headers("Bearer abc.def.ghi")), Ok("abc.def.ghi"));
    }

    #[test]
    fn malformed_headers_are_rejected() {
        assert!(extract_jwt_from_headers(&HeaderMap::new()).is_err());
        assert!(extract_jwt_from_headers(&headers("Basic dXNlcjpwYXNz")).is_err());
        assert!(extract_jwt_from_headers(&headers("Bearer   ")).is_err());
    }
}
