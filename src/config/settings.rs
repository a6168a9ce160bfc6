//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub auth: AuthConfig,
    pub seed: SeedConfig,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// One of trace, debug, info, warn, error
    pub level: String,
    /// Daily rolling log files are written here when set
    pub directory: Option<String>,
    pub file_prefix: String,
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub reset_token_ttl_hours: i64,
    /// Argon2 memory cost in KiB
    pub hash_memory_kib: u32,
    pub hash_iterations: u32,
    pub hash_parallelism: u32,
    pub default_admin: Option<DefaultAdminConfig>,
}

/// Account created on startup when the user table is empty
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DefaultAdminConfig {
    pub login: String,
    pub password: String,
    pub email: String,
}

/// Demo data configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SeedConfig {
    pub sample_data: bool,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Settings::default())?)
            .add_source(config::File::with_name("config").required(false))
            .add_source(
                config::Environment::with_prefix("ACTIVITY_TRACKER")
                    .try_parsing(true)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::TrackerError> {
        super::validation::validate_settings(self)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://activity_tracker.db".to_string(),
                max_connections: 10,
                min_connections: 1,
                acquire_timeout_seconds: 30,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                directory: None,
                file_prefix: "activity-tracker.log".to_string(),
            },
            auth: AuthConfig {
                reset_token_ttl_hours: 24,
                hash_memory_kib: 19 * 1024,
                hash_iterations: 2,
                hash_parallelism: 1,
                default_admin: Some(DefaultAdminConfig {
                    login: "admin".to_string(),
                    password: "admin123".to_string(),
                    email: "admin@universite.ma".to_string(),
                }),
            },
            seed: SeedConfig::default(),
        }
    }
}
