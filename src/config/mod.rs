use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

pub const DEFAULT_BCRYPT_COST: u32 = 10;

/// Longest accepted token lifetime (ten years)
pub const MAX_JWT_EXPIRY_HOURS: u64 = 24 * 365 * 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub filter: FilterConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Optional cap applied to `limit` on list queries. `None` leaves it unbounded.
    pub max_limit: Option<i64>,
    pub debug_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StorageBackend,
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub default_page_size: i64,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub bcrypt_cost: u32,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set")]
    MissingJwtSecret,

    #[error("bcrypt cost {0} is outside 4..=31")]
    InvalidBcryptCost(u32),

    #[error("DATABASE_URL must be set for the postgres storage backend")]
    MissingDatabaseUrl,

    #[error("default page size must be positive, got {0}")]
    InvalidPageSize(i64),

    #[error("filter max limit must be positive, got {0}")]
    InvalidMaxLimit(i64),

    #[error("JWT expiry must be between 1 and {MAX_JWT_EXPIRY_HOURS} hours, got {0}")]
    InvalidJwtExpiry(u64),
}

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
        // Filter overrides
        if let Ok(v) = env::var("FILTER_MAX_LIMIT") {
            self.filter.max_limit = v.parse().ok();
        }
        if let Ok(v) = env::var("FILTER_DEBUG_LOGGING") {
            self.filter.debug_logging = v.parse().unwrap_or(self.filter.debug_logging);
        }

        // Database overrides
        if let Ok(v) = env::var("STORAGE_BACKEND") {
            match v.to_ascii_lowercase().as_str() {
                "memory" => self.database.backend = StorageBackend::Memory,
                "postgres" | "postgresql" => self.database.backend = StorageBackend::Postgres,
                other => tracing::warn!("Unknown STORAGE_BACKEND '{}', keeping {:?}", other, self.database.backend),
            }
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // API overrides
        if let Some(port) = env::var("SHELF_API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.api.port = port;
        }
        if let Ok(v) = env::var("API_DEFAULT_PAGE_SIZE") {
            self.api.default_page_size = v.parse().unwrap_or(self.api.default_page_size);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_BCRYPT_COST") {
            self.security.bcrypt_cost = v.parse().unwrap_or(self.security.bcrypt_cost);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
        }

        self
    }

    /// Reject settings the server cannot start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.is_empty() {
            return Err(ConfigError::MissingJwtSecret);
        }
        if !(1..=MAX_JWT_EXPIRY_HOURS).contains(&self.security.jwt_expiry_hours) {
            return Err(ConfigError::InvalidJwtExpiry(self.security.jwt_expiry_hours));
        }
        if !(4..=31).contains(&self.security.bcrypt_cost) {
            return Err(ConfigError::InvalidBcryptCost(self.security.bcrypt_cost));
        }
        if self.database.backend == StorageBackend::Postgres && self.database.url.is_none() {
            return Err(ConfigError::MissingDatabaseUrl);
        }
        if self.api.default_page_size < 1 {
            return Err(ConfigError::InvalidPageSize(self.api.default_page_size));
        }
        if let Some(max) = self.filter.max_limit.filter(|max| *max < 1) {
            return Err(ConfigError::InvalidMaxLimit(max));
        }
        Ok(())
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            filter: FilterConfig {
                max_limit: None,
                debug_logging: true,
            },
            database: DatabaseConfig {
                backend: StorageBackend::Postgres,
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            api: ApiConfig {
                port: 3000,
                default_page_size: 10,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                jwt_secret: "development-only-secret".to_string(),
                jwt_expiry_hours: 24,
                bcrypt_cost: DEFAULT_BCRYPT_COST,
                cors_origins: vec![],
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            filter: FilterConfig {
                max_limit: None,
                debug_logging: false,
            },
            database: DatabaseConfig {
                backend: StorageBackend::Postgres,
                url: None,
                max_connections: 20,
                connection_timeout: 10,
            },
            api: ApiConfig {
                port: 3000,
                default_page_size: 10,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                bcrypt_cost: DEFAULT_BCRYPT_COST,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            filter: FilterConfig {
                max_limit: None,
                debug_logging: false,
            },
            database: DatabaseConfig {
                backend: StorageBackend::Postgres,
                url: None,
                max_connections: 50,
                connection_timeout: 5,
            },
            api: ApiConfig {
                port: 3000,
                default_page_size: 10,
                enable_request_logging: false,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                bcrypt_cost: DEFAULT_BCRYPT_COST,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
        }
    }

    /// In-memory configuration with a fixed secret and the cheapest bcrypt cost.
    pub fn for_tests() -> Self {
        let mut config = Self::development();
        config.database.backend = StorageBackend::Memory;
        config.security.jwt_secret = "test-secret-key-12345".to_string();
        config.security.bcrypt_cost = 4;
        config.filter.debug_logging = false;
        config
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
        assert_eq!(config.filter.max_limit, None);
        assert_eq!(config.api.default_page_size, 10);
        assert_eq!(config.security.jwt_expiry_hours, 24);
        assert_eq!(config.security.bcrypt_cost, 10);
    }

    #[test]
    fn test_production_requires_secret() {
        let mut config = AppConfig::production();
        config.database.url = Some("postgres://localhost/bookshelf".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::MissingJwtSecret)));

        config.security.jwt_secret = "s3cret".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_bcrypt_cost() {
        let mut config = AppConfig::for_tests();
        config.security.bcrypt_cost = 2;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidBcryptCost(2))));
    }

    #[test]
    fn test_rejects_non_positive_max_limit() {
        let mut config = AppConfig::for_tests();
        config.filter.max_limit = Some(-1);
        assert!(matches!(config.validate(), Err(ConfigError::InvalidMaxLimit(-1))));

        config.filter.max_limit = Some(0);
        assert!(matches!(config.validate(), Err(ConfigError::InvalidMaxLimit(0))));

        config.filter.max_limit = Some(1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_jwt_expiry() {
        let mut config = AppConfig::for_tests();
        config.security.jwt_expiry_hours = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidJwtExpiry(0))));

        config.security.jwt_expiry_hours = u64::MAX;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidJwtExpiry(u64::MAX))));

        config.security.jwt_expiry_hours = MAX_JWT_EXPIRY_HOURS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_postgres_backend_needs_url() {
        let mut config = AppConfig::for_tests();
        config.database.backend = StorageBackend::Postgres;
        assert!(matches!(config.validate(), Err(ConfigError::MissingDatabaseUrl)));
    }

    #[test]
    fn test_secret_not_serialized() {
        let json = serde_json::to_value(AppConfig::for_tests()).unwrap();
        assert!(json["security"].get("jwt_secret").is_none());
    }
}
