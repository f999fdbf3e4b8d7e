use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Which persistence engine backs the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageBackend {
    /// Process-local key-value map, lost on exit
    Memory,
    /// Key-value map snapshotted to a JSON file
    File,
    /// Key-value rows in a postgres `kv_store` table
    KvPostgres,
    /// JSONB documents in postgres tables
    Postgres,
}

impl std::str::FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(StorageBackend::Memory),
            "file" | "json" => Ok(StorageBackend::File),
            "kv-postgres" | "kv_postgres" | "kv" => Ok(StorageBackend::KvPostgres),
            "postgres" | "postgresql" | "documents" => Ok(StorageBackend::Postgres),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub database_url: Option<String>,
    pub data_path: PathBuf,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub min_password_length: usize,
    pub allow_admin_signup: bool,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

/// Admin account ensured at server start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapAdmin {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
}

/// Upper bound on token lifetime (one year).
pub const MAX_JWT_EXPIRY_HOURS: u64 = 24 * 365;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown storage backend '{0}' (expected memory, file, kv-postgres or postgres)")]
    UnknownBackend(String),

    #[error("JWT secret is not configured (set JWT_SECRET)")]
    MissingJwtSecret,

    #[error("storage backend {0:?} requires DATABASE_URL")]
    MissingDatabaseUrl(StorageBackend),

    #[error("invalid DATABASE_URL: {0}")]
    InvalidDatabaseUrl(String),

    #[error("server port must be non-zero")]
    InvalidPort,

    #[error("JWT expiry must be between 1 and {MAX_JWT_EXPIRY_HOURS} hours, got {0}")]
    InvalidJwtExpiry(u64),
}

const DEV_JWT_SECRET: &str = "homeserve-dev-secret";

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("HOST") {
            self.server.host = v;
        }
        if let Some(port) = env::var("HOMESERVE_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse().ok())
        {
            self.server.port = port;
        }

        // Storage overrides
        if let Ok(v) = env::var("STORAGE_BACKEND") {
            match v.parse() {
                Ok(backend) => self.storage.backend = backend,
                Err(e) => tracing::warn!("ignoring STORAGE_BACKEND: {}", e),
            }
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.storage.database_url = Some(v);
        }
        if let Ok(v) = env::var("STORAGE_PATH") {
            self.storage.data_path = PathBuf::from(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.storage.max_connections = v.parse().unwrap_or(self.storage.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.storage.connection_timeout = v.parse().unwrap_or(self.storage.connection_timeout);
        }

        // API overrides
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_MIN_PASSWORD_LENGTH") {
            self.security.min_password_length = v.parse().unwrap_or(self.security.min_password_length);
        }
        if let Ok(v) = env::var("SECURITY_ALLOW_ADMIN_SIGNUP") {
            self.security.allow_admin_signup = v.parse().unwrap_or(self.security.allow_admin_signup);
        }
        if let (Ok(email), Ok(password)) = (
            env::var("BOOTSTRAP_ADMIN_EMAIL"),
            env::var("BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            self.security.bootstrap_admin = Some(BootstrapAdmin {
                name: env::var("BOOTSTRAP_ADMIN_NAME").unwrap_or_else(|_| "Administrator".to_string()),
                email,
                password,
            });
        }

        self
    }

    /// Reject configurations the server cannot start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if self.security.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingJwtSecret);
        }
        if !(1..=MAX_JWT_EXPIRY_HOURS).contains(&self.security.jwt_expiry_hours) {
            return Err(ConfigError::InvalidJwtExpiry(self.security.jwt_expiry_hours));
        }
        match self.storage.backend {
            StorageBackend::KvPostgres | StorageBackend::Postgres => {
                let raw = self
                    .storage
                    .database_url
                    .as_deref()
                    .ok_or(ConfigError::MissingDatabaseUrl(self.storage.backend))?;
                url::Url::parse(raw).map_err(|e| ConfigError::InvalidDatabaseUrl(e.to_string()))?;
            }
            StorageBackend::Memory | StorageBackend::File => {}
        }
        Ok(())
    }

    /// Database URL with the password masked, for logs.
    pub fn redacted_database_url(&self) -> Option<String> {
        let raw = self.storage.database_url.as_deref()?;
        match url::Url::parse(raw) {
            Ok(mut url) => {
                if url.password().is_some() {
                    let _ = url.set_password(Some("***"));
                }
                Some(url.to_string())
            }
            Err(_) => Some("<unparseable>".to_string()),
        }
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            storage: StorageConfig {
                backend: StorageBackend::Memory,
                database_url: None,
                data_path: PathBuf::from("data/homeserve.json"),
                max_connections: 10,
                connection_timeout: 30,
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 1024 * 1024, // 1MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                jwt_secret: DEV_JWT_SECRET.to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                min_password_length: 6,
                allow_admin_signup: true,
                bootstrap_admin: None,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            storage: StorageConfig {
                backend: StorageBackend::Postgres,
                database_url: None,
                data_path: PathBuf::from("data/homeserve.json"),
                max_connections: 20,
                connection_timeout: 10,
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 512 * 1024,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                min_password_length: 8,
                allow_admin_signup: false,
                bootstrap_admin: None,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            storage: StorageConfig {
                backend: StorageBackend::Postgres,
                database_url: None,
                data_path: PathBuf::from("data/homeserve.json"),
                max_connections: 50,
                connection_timeout: 5,
            },
            api: ApiConfig {
                enable_request_logging: false,
                max_request_size_bytes: 256 * 1024,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
                jwt_secret: String::new(),
                jwt_expiry_hours: 12,
                min_password_length: 8,
                allow_admin_signup: false,
                bootstrap_admin: None,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert!(config.security.allow_admin_signup);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(!config.security.allow_admin_signup);
        assert_eq!(config.storage.backend, StorageBackend::Postgres);
        // No secret and no database url until the environment provides them
        assert!(matches!(config.validate(), Err(ConfigError::MissingJwtSecret)));
    }

    #[test]
    fn postgres_backend_requires_database_url() {
        let mut config = AppConfig::development();
        config.storage.backend = StorageBackend::KvPostgres;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingDatabaseUrl(StorageBackend::KvPostgres))
        ));

        config.storage.database_url = Some("postgres://app:hunter2@db:5432/homeserve".to_string());
        assert!(config.validate().is_ok());
        let redacted = config.redacted_database_url().unwrap();
        assert!(!redacted.contains("hunter2"));
        assert!(redacted.contains("db:5432/homeserve"));
    }

    #[test]
    fn jwt_expiry_is_bounded() {
        let mut config = AppConfig::development();
        config.security.jwt_expiry_hours = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidJwtExpiry(0))));

        config.security.jwt_expiry_hours = u64::MAX;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidJwtExpiry(_))));

        config.security.jwt_expiry_hours = MAX_JWT_EXPIRY_HOURS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parses_backend_names() {
        assert_eq!("memory".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);
        assert_eq!("FILE".parse::<StorageBackend>().unwrap(), StorageBackend::File);
        assert_eq!("kv-postgres".parse::<StorageBackend>().unwrap(), StorageBackend::KvPostgres);
        assert_eq!("postgres".parse::<StorageBackend>().unwrap(), StorageBackend::Postgres);
        assert!("mongo".parse::<StorageBackend>().is_err());
    }
}
