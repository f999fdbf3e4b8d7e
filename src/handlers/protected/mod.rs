// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Route prefix: /api/*
// Middleware: jwt_auth_middleware, then validate_user_middleware, which
// injects `CurrentUser`.

pub mod auth;
pub mod requests;
pub mod workers;
