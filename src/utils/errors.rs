//! Error handling for the activity tracker
//!
//! This module defines the error types used throughout the crate. Absent
//! lookups are modelled as `Option`, so none of these variants mean "not found"
//! except inside the authentication flow, where the reason is kept private.

use thiserror::Error;

/// Main error type for the activity tracker
#[derive(Error, Debug)]
pub enum TrackerError {
    /// The store rejected or failed an operation. The unit-of-work has been
    /// rolled back; the source is kept for logs but not shown to callers.
    #[error("Store operation failed")]
    Transaction(#[from] sqlx::Error),

    #[error("Schema bootstrap failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Input rejected before any store mutation was attempted
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{field} is required")]
    MissingField { field: &'static str },

    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("login already exists: {0}")]
    DuplicateLogin(String),

    #[error("email already exists: {0}")]
    DuplicateEmail(String),

    #[error("registration number already exists: {0}")]
    DuplicateRegistrationNumber(String),

    #[error("user {0} is already linked to another student")]
    DuplicateUserLink(i64),

    #[error("{entity} {id} does not exist")]
    UnknownReference { entity: &'static str, id: i64 },

    #[error("{0}")]
    Invalid(String),
}

/// Authentication failures.
///
/// Every variant renders the same generic denial so callers cannot tell an
/// unknown login from a wrong password. Use [`AuthError::reason`] for logs.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("Authentication failed")]
    NotFound,

    #[error("Authentication failed")]
    InactiveAccount,

    #[error("Authentication failed")]
    BadCredentials,

    #[error("Authentication failed")]
    InvalidToken,

    #[error("Authentication failed")]
    ExpiredToken,

    #[error("Authentication failed")]
    NotLoggedIn,
}

impl AuthError {
    /// Specific reason, for log output only
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::NotFound => "unknown account",
            AuthError::InactiveAccount => "account is not active",
            AuthError::BadCredentials => "password mismatch",
            AuthError::InvalidToken => "unknown reset token",
            AuthError::ExpiredToken => "reset token expired",
            AuthError::NotLoggedIn => "no user is logged in",
        }
    }
}

impl From<config::ConfigError> for TrackerError {
    fn from(err: config::ConfigError) -> Self {
        TrackerError::Config(err.to_string())
    }
}

/// Result type alias for tracker operations
pub type Result<T> = std::result::Result<T, TrackerError>;

impl TrackerError {
    /// Check if the error is recoverable by the immediate caller
    pub fn is_recoverable(&self) -> bool {
        match self {
            TrackerError::Transaction(_) => false,
            TrackerError::Migration(_) => false,
            TrackerError::Config(_) => false,
            TrackerError::Validation(_) => true,
            TrackerError::Auth(_) => true,
            TrackerError::Hashing(_) => false,
            TrackerError::Io(_) => true,
            TrackerError::Serialization(_) => false,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TrackerError::Transaction(_) => ErrorSeverity::Critical,
            TrackerError::Migration(_) => ErrorSeverity::Critical,
            TrackerError::Config(_) => ErrorSeverity::Critical,
            TrackerError::Auth(_) => ErrorSeverity::Warning,
            TrackerError::Validation(_) => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }

    /// Shorthand used by callers that only care about the auth outcome
    pub fn as_auth(&self) -> Option<AuthError> {
        match self {
            TrackerError::Auth(err) => Some(*err),
            _ => None,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_errors_share_generic_message() {
        let messages: Vec<String> = [
            AuthError::NotFound,
            AuthError::InactiveAccount,
            AuthError::BadCredentials,
            AuthError::InvalidToken,
            AuthError::ExpiredToken,
        ]
        .iter()
        .map(|e| TrackerError::from(*e).to_string())
        .collect();

        assert!(messages.iter().all(|m| m == "Authentication failed"));
    }

    #[test]
    fn test_store_error_is_opaque() {
        let err = TrackerError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.to_string(), "Store operation failed");
        assert!(!err.is_recoverable());
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_validation_is_recoverable() {
        let err = TrackerError::from(ValidationError::DuplicateLogin("admin".to_string()));
        assert!(err.is_recoverable());
        assert_eq!(err.severity(), ErrorSeverity::Info);
        assert_eq!(err.to_string(), "Validation failed: login already exists: admin");
    }

    #[test]
    fn test_as_auth() {
        let err = TrackerError::from(AuthError::ExpiredToken);
        assert_eq!(err.as_auth(), Some(AuthError::ExpiredToken));
        assert_eq!(err.as_auth().map(|e| e.reason()), Some("reset token expired"));
        assert!(TrackerError::Config("x".to_string()).as_auth().is_none());
    }
}
