pub mod document;
pub mod kv;
pub mod kv_repository;
pub mod manager;
pub mod models;
pub mod repository;

pub use manager::{DatabaseError, DatabaseManager};
pub use repository::Repository;
