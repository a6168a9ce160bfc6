//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the activity tracker.

use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;
use crate::utils::errors::{Result, TrackerError};

/// Initialize logging based on configuration.
///
/// Returns the file appender guard when file logging is enabled; keep it alive
/// for as long as logs should be flushed.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_new(&config.level)
        .map_err(|e| TrackerError::Config(format!("Invalid log filter '{}': {}", config.level, e)))?;

    let (file_layer, guard) = match &config.directory {
        Some(directory) => {
            let file_appender = tracing_appender::rolling::daily(directory, &config.file_prefix);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer().with_ansi(false).with_writer(non_blocking);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stdout))
        .with(file_layer)
        .try_init()
        .map_err(|e| TrackerError::Config(format!("Logging already initialized: {}", e)))?;

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log database operations
pub fn log_database_operation(operation: &str, duration_ms: u64, success: bool) {
    if success {
        debug!(
            operation = operation,
            duration_ms = duration_ms,
            "Database operation completed"
        );
    } else {
        error!(
            operation = operation,
            duration_ms = duration_ms,
            "Database operation failed"
        );
    }
}

/// Log a denied authentication attempt without leaking it to the caller
pub fn log_auth_failure(subject: &str, action: &str, reason: &str) {
    warn!(
        subject = subject,
        action = action,
        reason = reason,
        "Authentication denied"
    );
}

/// Log account actions with structured data
pub fn log_account_action(login: &str, action: &str) {
    info!(login = login, action = action, "Account action performed");
}
