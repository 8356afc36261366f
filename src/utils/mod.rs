//! Utility functions and helpers.

pub mod http;

use chrono::Utc;

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Format a number the way it should read on a card: `5`, `2.2`, `12.5`.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        // Drop the sign of negative zero.
        return "0".to_string();
    }
    format!("{value}")
}
