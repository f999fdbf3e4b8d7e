pub mod admin;
pub mod requests;
pub mod seed;
pub mod stats;
pub mod users;
