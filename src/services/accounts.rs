use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::catalog::CatalogService;
use super::validation::{validate_email_format, validate_name, validate_password};
use super::{ServiceError, ServiceResult};
use crate::auth::{self, Claims};
use crate::config::{BootstrapAdmin, SecurityConfig, MAX_JWT_EXPIRY_HOURS};
use crate::database::manager::DatabaseError;
use crate::database::models::{normalize_email, Role, StoredUser, UserProfile, WorkerDetails, WorkerProfile};
use crate::database::repository::Repository;

/// Registration payload. `additionalData` and `occupation` are accepted for
/// clients written against the older API.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default, alias = "additionalData")]
    pub worker: Option<WorkerDetails>,
    #[serde(default)]
    pub occupation: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub user: UserProfile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_profile: Option<WorkerProfile>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginSession {
    pub token: String,
    pub token_type: &'static str,
    /// Seconds until the token expires.
    pub expires_in: u64,
    pub user: UserProfile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_profile: Option<WorkerProfile>,
}

pub struct AccountService {
    repo: Arc<dyn Repository>,
    catalog: Arc<CatalogService>,
    security: SecurityConfig,
}

impl AccountService {
    pub fn new(repo: Arc<dyn Repository>, catalog: Arc<CatalogService>, security: SecurityConfig) -> Self {
        Self { repo, catalog, security }
    }

    #[instrument(skip(self, input), fields(email = %input.email, role = %input.role))]
    pub async fn register(&self, input: RegisterInput) -> ServiceResult<AccountView> {
        let RegisterInput {
            name,
            email,
            password,
            role,
            phone,
            address,
            worker,
            occupation,
        } = input;

        let name = name.trim().to_string();
        validate_name(&name)?;
        let email = normalize_email(&email);
        validate_email_format(&email)?;
        validate_password(&password, self.security.min_password_length)?;

        let address = match worker.as_ref().and_then(|w| w.address.as_deref()) {
            Some(legacy) if address.trim().is_empty() => legacy.to_string(),
            _ => address,
        };

        if role == Role::Admin && !self.security.allow_admin_signup {
            return Err(ServiceError::Forbidden("Admin accounts cannot be self-registered".to_string()));
        }

        let details = match role {
            Role::Worker => {
                let mut details = worker.unwrap_or_default();
                if details.service_types.is_empty() {
                    if let Some(occupation) = occupation.filter(|o| !o.trim().is_empty()) {
                        details.service_types.push(occupation.trim().to_string());
                    }
                }
                self.check_service_types(&details.service_types).await?;
                Some(details)
            }
            Role::User | Role::Admin => None,
        };

        let password_hash = hash_blocking(password).await?;
        let profile = UserProfile {
            id: Uuid::new_v4(),
            email,
            name,
            role,
            phone: phone.trim().to_string(),
            address: address.trim().to_string(),
            created_at: Utc::now(),
        };
        let worker_profile = details.map(|details| {
            WorkerProfile::new(
                profile.id,
                profile.name.clone(),
                profile.email.clone(),
                profile.phone.clone(),
                details,
            )
        });

        let stored = StoredUser {
            profile: profile.clone(),
            password_hash,
        };
        self.repo
            .create_user(&stored, worker_profile.as_ref())
            .await
            .map_err(|e| match e {
                DatabaseError::Conflict(_) => ServiceError::Conflict("Email already registered".to_string()),
                other => other.into(),
            })?;

        info!(user_id = %profile.id, "account registered");
        Ok(AccountView {
            user: profile,
            worker_profile,
        })
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> ServiceResult<LoginSession> {
        let email = normalize_email(email);
        let Some(stored) = self.repo.user_by_email(&email).await? else {
            warn!("login for unknown email");
            return Err(ServiceError::InvalidCredentials);
        };

        let hash = stored.password_hash.clone();
        let password = password.to_string();
        let matches = tokio::task::spawn_blocking(move || auth::verify_password(&password, &hash)).await??;
        if !matches {
            warn!(user_id = %stored.id(), "login with wrong password");
            return Err(ServiceError::InvalidCredentials);
        }

        let user = stored.profile;
        let claims = Claims::new(&user, self.security.jwt_expiry_hours);
        let token = auth::generate_jwt(&claims, &self.security.jwt_secret)?;
        let worker_profile = self.worker_profile_of(&user).await?;

        info!(user_id = %user.id, role = %user.role, "login succeeded");
        Ok(LoginSession {
            token,
            token_type: "Bearer",
            expires_in: self.security.jwt_expiry_hours.min(MAX_JWT_EXPIRY_HOURS) * 3600,
            user,
            worker_profile,
        })
    }

    pub async fn profile(&self, user_id: Uuid) -> ServiceResult<AccountView> {
        let stored = self
            .repo
            .user_by_id(user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;
        let worker_profile = self.worker_profile_of(&stored.profile).await?;
        Ok(AccountView {
            user: stored.profile,
            worker_profile,
        })
    }

    pub async fn all_users(&self) -> ServiceResult<Vec<UserProfile>> {
        Ok(self.repo.list_users().await?)
    }

    /// Create an admin account, or return the existing one when the email
    /// already belongs to an admin.
    #[instrument(skip(self, password))]
    pub async fn create_admin(&self, name: &str, email: &str, password: &str) -> ServiceResult<UserProfile> {
        let email = normalize_email(email);
        if let Some(existing) = self.repo.user_by_email(&email).await? {
            if existing.profile.role == Role::Admin {
                return Ok(existing.profile);
            }
            return Err(ServiceError::Conflict(format!(
                "{} is already registered as {}",
                email, existing.profile.role
            )));
        }

        validate_name(name)?;
        validate_email_format(&email)?;
        validate_password(password, self.security.min_password_length)?;

        let profile = UserProfile {
            id: Uuid::new_v4(),
            email,
            name: name.trim().to_string(),
            role: Role::Admin,
            phone: String::new(),
            address: String::new(),
            created_at: Utc::now(),
        };
        let stored = StoredUser {
            profile: profile.clone(),
            password_hash: hash_blocking(password.to_string()).await?,
        };
        self.repo.create_user(&stored, None).await?;
        info!(user_id = %profile.id, "admin account created");
        Ok(profile)
    }

    pub async fn ensure_bootstrap_admin(&self, admin: Option<&BootstrapAdmin>) -> ServiceResult<()> {
        match admin {
            Some(admin) => {
                self.create_admin(&admin.name, &admin.email, &admin.password).await?;
                Ok(())
            }
            None => Ok(()),
        }
    }

    async fn worker_profile_of(&self, user: &UserProfile) -> ServiceResult<Option<WorkerProfile>> {
        if user.role != Role::Worker {
            return Ok(None);
        }
        Ok(self.repo.worker_by_id(user.id).await?)
    }

    async fn check_service_types(&self, service_types: &[String]) -> ServiceResult<()> {
        if service_types.is_empty() {
            return Err(ServiceError::invalid_field(
                "serviceTypes",
                "Workers must offer at least one service",
            ));
        }
        for service_type in service_types {
            self.catalog.require_service(service_type).await.map_err(|_| {
                ServiceError::invalid_field("serviceTypes", format!("Unknown service '{}'", service_type))
            })?;
        }
        Ok(())
    }
}

async fn hash_blocking(password: String) -> ServiceResult<String> {
    Ok(tokio::task::spawn_blocking(move || auth::hash_password(&password)).await??)
}
