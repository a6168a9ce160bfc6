//! Utility modules
//!
//! This module contains common utilities used throughout the crate,
//! including error handling, logging setup, input validation and helper functions.

pub mod errors;
pub mod helpers;
pub mod logging;
pub mod validation;

pub use errors::{AuthError, Result, TrackerError, ValidationError};
