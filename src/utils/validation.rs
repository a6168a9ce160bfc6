//! Field-level input checks shared by the entity models

use regex::Regex;
use std::sync::OnceLock;

use crate::utils::errors::ValidationError;

/// Reject empty or whitespace-only required text
pub fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField { field });
    }
    Ok(())
}

/// Basic address shape check: something@domain.tld
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    require_text("email", email)?;

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err(ValidationError::InvalidEmail(email.to_string()));
    }

    Ok(())
}

/// Inclusive range check; NaN is always out of range
pub fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ValidationError> {
    if value.is_nan() || value < min || value > max {
        return Err(ValidationError::OutOfRange { field, value, min, max });
    }
    Ok(())
}
