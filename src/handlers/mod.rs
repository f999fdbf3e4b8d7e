// handlers/mod.rs - 3-tier handler layout
//
// Public (no auth) → Protected (bearer JWT + account check) → Elevated (admin role)
//
// Handlers stay thin: extract, call a service, wrap the result in the envelope.

pub mod elevated;
pub mod protected;
pub mod public;
