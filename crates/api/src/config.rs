//! Application configuration

use std::env;
use std::str::FromStr;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub bind_address: String,

    // Storage
    pub storage_backend: StorageBackend,
    pub database_url: Option<String>,
    pub database_max_connections: u32,

    // Authentication
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub flash_secret: String,

    // Back office
    pub resource_tag: String,
    pub ssl_enabled: bool,
    pub translations_path: Option<String>,

    // Logging
    pub log_format: LogFormat,
}

/// Where sessions and settings are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            _ => Err(ConfigError::Invalid(
                "STORAGE_BACKEND must be either 'postgres' or 'memory'",
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let storage_backend: StorageBackend = env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "postgres".to_string())
            .parse()?;

        let database_url = env::var("DATABASE_URL").ok().filter(|url| !url.is_empty());
        if storage_backend == StorageBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        Ok(Self {
            // Server
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),

            // Storage
            storage_backend,
            database_url,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),

            // Authentication
            jwt_secret: required_secret("JWT_SECRET")?,
            jwt_expiry_hours: env::var("JWT_EXPIRY_HOURS")
                .unwrap_or_else(|_| "8".to_string())
                .parse()
                .unwrap_or(8),
            flash_secret: required_secret("FLASH_SECRET")?,

            // Back office
            resource_tag: env::var("ADMIN_RESOURCE_TAG")
                .ok()
                .map(|tag| tag.trim().to_string())
                .filter(|tag| !tag.is_empty())
                .unwrap_or_else(|| "AdminSecurity".to_string()),
            ssl_enabled: env::var("SSL_ENABLED")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
            translations_path: env::var("TRANSLATIONS_PATH").ok().filter(|p| !p.is_empty()),

            // Logging
            log_format: match env::var("LOG_FORMAT").unwrap_or_default().to_lowercase().as_str() {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        })
    }
}

/// Secrets used for signing must be present and long enough
fn required_secret(name: &'static str) -> Result<String, ConfigError> {
    let secret = env::var(name).map_err(|_| ConfigError::Missing(name))?;
    if secret.len() < 32 {
        return Err(ConfigError::WeakSecret(name));
    }
    Ok(secret)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Weak secret: {0} must be at least 32 characters")]
    WeakSecret(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}
