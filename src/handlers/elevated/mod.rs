// handlers/elevated/mod.rs - Elevated handlers (admin role required)
//
// Route prefix: /api/admin/*
// Middleware: the protected stack plus require_admin_middleware.

pub mod admin;
