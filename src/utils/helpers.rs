//! Helper functions and utilities
//!
//! This module contains small numeric and formatting helpers shared by the
//! models, repositories and services.

use chrono::{DateTime, Utc};

/// `part / total * 100`, or 0 when there is nothing to divide by
pub fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (part as f64 * 100.0) / total as f64
}

/// Arithmetic mean, or 0 for an empty sequence
pub fn mean<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));

    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Case-insensitive substring test with full Unicode case folding.
///
/// SQLite's `LOWER()` only folds ASCII, so text searches filter in Rust.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Format a timestamp for display
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Round to two decimal places for reports
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
