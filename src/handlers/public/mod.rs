// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Route prefix: /auth/* and the read-only catalogue under /api/services.

pub mod auth;
pub mod services;
