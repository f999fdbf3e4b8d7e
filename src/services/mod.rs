//! Business operations, independent of the HTTP layer.
//!
//! Handlers and the CLI both drive these; they talk to storage only through
//! the `Repository` trait.

use std::sync::Arc;
use thiserror::Error;

use crate::auth::{JwtError, PasswordError};
use crate::config::AppConfig;
use crate::database::manager::DatabaseError;
use crate::database::repository::Repository;

pub mod accounts;
pub mod bookings;
pub mod catalog;
pub mod validation;

pub use accounts::{AccountService, AccountView, LoginSession, RegisterInput};
pub use bookings::{BookingService, CreateRequestInput, PlatformStats};
pub use catalog::CatalogService;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{message}")]
    Validation { field: Option<String>, message: String },

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Token(#[from] JwtError),

    #[error("blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation {
            field: None,
            message: message.into(),
        }
    }

    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        ServiceError::Validation {
            field: Some(field.to_string()),
            message: message.into(),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// The three services wired to one repository.
#[derive(Clone)]
pub struct Services {
    pub accounts: Arc<AccountService>,
    pub catalog: Arc<CatalogService>,
    pub bookings: Arc<BookingService>,
}

impl Services {
    pub fn new(repo: Arc<dyn Repository>, config: &AppConfig) -> Self {
        let catalog = Arc::new(CatalogService::new(repo.clone()));
        Self {
            accounts: Arc::new(AccountService::new(repo.clone(), catalog.clone(), config.security.clone())),
            bookings: Arc::new(BookingService::new(repo)),
            catalog,
        }
    }
}
