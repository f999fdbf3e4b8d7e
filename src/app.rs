use axum::{
    extract::State,
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::config::{AppConfig, Environment};
use crate::database::repository::Repository;
use crate::handlers::{elevated, protected, public};
use crate::middleware::{jwt_auth_middleware, require_admin_middleware, validate_user_middleware};
use crate::services::Services;

/// Shared per-process state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repository>,
    pub config: Arc<AppConfig>,
    pub services: Services,
}

impl AppState {
    pub fn new(repo: Arc<dyn Repository>, config: Arc<AppConfig>) -> Self {
        let services = Services::new(repo.clone(), &config);
        Self { repo, config, services }
    }
}

pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(public_routes())
        // Protected API
        .merge(protected_routes(state.clone()))
        .merge(admin_routes(state.clone()))
        .layer(RequestBodyLimitLayer::new(state.config.api.max_request_size_bytes));

    if state.config.security.enable_cors {
        router = router.layer(cors_layer(&state.config));
    }
    if state.config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(public::auth::register))
        .route("/auth/login", post(public::auth::login))
        .route("/api/services", get(public::services::list_services))
        .route(
            "/api/services/:service_id/workers",
            get(public::services::workers_for_service),
        )
}

fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/auth/whoami", get(protected::auth::whoami))
        .route("/api/workers/me", put(protected::workers::update_me))
        .route("/api/workers/:worker_id/rating", post(protected::workers::rate))
        .route("/api/requests", post(protected::requests::create))
        .route("/api/requests/mine", get(protected::requests::mine))
        .route("/api/requests/assigned", get(protected::requests::assigned))
        .route(
            "/api/requests/:request_id/status",
            put(protected::requests::update_status),
        )
        .route(
            "/api/requests/:request_id/payment",
            put(protected::requests::update_payment),
        )
        // The last layer added runs first: JWT, then the account check
        .route_layer(middleware::from_fn_with_state(state.clone(), validate_user_middleware))
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}

fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/admin/users", get(elevated::admin::users))
        .route("/api/admin/workers", get(elevated::admin::workers))
        .route(
            "/api/admin/workers/:worker_id/verify",
            put(elevated::admin::verify_worker),
        )
        .route("/api/admin/requests", get(elevated::admin::requests))
        .route("/api/admin/stats", get(elevated::admin::stats))
        .route_layer(middleware::from_fn(require_admin_middleware))
        .route_layer(middleware::from_fn_with_state(state.clone(), validate_user_middleware))
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    if config.environment == Environment::Development
        || origins.is_empty()
        || config.security.cors_origins.iter().any(|o| o == "*")
    {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "HomeServe API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Booking backend connecting customers with home-service workers",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "auth": "/auth/register, /auth/login (public - token acquisition)",
                "services": "/api/services[/:service_id/workers] (public)",
                "account": "/api/auth/whoami (protected)",
                "workers": "/api/workers/me, /api/workers/:worker_id/rating (protected)",
                "requests": "/api/requests[/mine|/assigned|/:request_id/status|/:request_id/payment] (protected)",
                "admin": "/api/admin/* (admin only)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();
    let backend = state.config.storage.backend;

    match state.repo.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "storage": backend,
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "error": true,
                    "message": "storage unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "storage": backend,
                    }
                })),
            )
        }
    }
}
