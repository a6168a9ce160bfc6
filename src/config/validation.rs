//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use super::Settings;
use crate::utils::errors::{Result, TrackerError};

/// One year
pub const MAX_RESET_TOKEN_TTL_HOURS: i64 = 8760;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_database_config(&settings.database)?;
    validate_logging_config(&settings.logging)?;
    validate_auth_config(&settings.auth)?;

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(TrackerError::Config("Database URL is required".to_string()));
    }

    if !config.url.starts_with("sqlite:") {
        return Err(TrackerError::Config(format!(
            "Unsupported database URL: {}",
            config.url
        )));
    }

    if config.max_connections == 0 {
        return Err(TrackerError::Config(
            "Max connections must be greater than 0".to_string(),
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(TrackerError::Config(
            "Min connections cannot be greater than max connections".to_string(),
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(TrackerError::Config("Log level is required".to_string()));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(TrackerError::Config(format!(
            "Invalid log level: {}. Valid levels: {:?}",
            config.level, valid_levels
        )));
    }

    if config.directory.is_some() && config.file_prefix.is_empty() {
        return Err(TrackerError::Config(
            "Log file prefix is required when a log directory is set".to_string(),
        ));
    }

    Ok(())
}

/// Validate authentication configuration
fn validate_auth_config(config: &super::AuthConfig) -> Result<()> {
    if config.reset_token_ttl_hours <= 0 {
        return Err(TrackerError::Config(
            "Reset token TTL must be greater than 0".to_string(),
        ));
    }

    if config.reset_token_ttl_hours > MAX_RESET_TOKEN_TTL_HOURS {
        return Err(TrackerError::Config(format!(
            "Reset token TTL cannot exceed {} hours",
            MAX_RESET_TOKEN_TTL_HOURS
        )));
    }

    // Argon2 lower bounds: 8 KiB per lane, at least one pass and one lane
    if config.hash_parallelism == 0 || config.hash_iterations == 0 {
        return Err(TrackerError::Config(
            "Hash iterations and parallelism must be greater than 0".to_string(),
        ));
    }

    if config.hash_memory_kib < 8 * config.hash_parallelism {
        return Err(TrackerError::Config(format!(
            "Hash memory must be at least {} KiB",
            8 * config.hash_parallelism
        )));
    }

    if let Some(admin) = &config.default_admin {
        if admin.login.is_empty() || admin.password.is_empty() || admin.email.is_empty() {
            return Err(TrackerError::Config(
                "Default admin requires login, password and email".to_string(),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_rejects_bad_database_config() {
        let mut settings = Settings::default();
        settings.database.url = String::new();
        assert_matches!(validate_settings(&settings), Err(TrackerError::Config(_)));

        let mut settings = Settings::default();
        settings.database.url = "postgresql://localhost/tracker".to_string();
        assert_matches!(validate_settings(&settings), Err(TrackerError::Config(_)));

        let mut settings = Settings::default();
        settings.database.min_connections = 20;
        assert_matches!(validate_settings(&settings), Err(TrackerError::Config(_)));
    }

    #[test]
    fn test_rejects_unknown_log_level() {
        let mut settings = Settings::default();
        settings.logging.level = "verbose".to_string();
        assert_matches!(validate_settings(&settings), Err(TrackerError::Config(msg)) if msg.contains("verbose"));
    }

    #[test]
    fn test_rejects_bad_auth_config() {
        let mut settings = Settings::default();
        settings.auth.reset_token_ttl_hours = 0;
        assert_matches!(validate_settings(&settings), Err(TrackerError::Config(_)));

        let mut settings = Settings::default();
        settings.auth.reset_token_ttl_hours = 10_000_000_000;
        assert_matches!(validate_settings(&settings), Err(TrackerError::Config(msg)) if msg.contains("8760"));

        let mut settings = Settings::default();
        settings.auth.reset_token_ttl_hours = MAX_RESET_TOKEN_TTL_HOURS;
        assert!(validate_settings(&settings).is_ok());

        let mut settings = Settings::default();
        settings.auth.hash_memory_kib = 4;
        assert_matches!(validate_settings(&settings), Err(TrackerError::Config(_)));

        let mut settings = Settings::default();
        settings.auth.default_admin = None;
        assert!(validate_settings(&settings).is_ok());
    }
}
