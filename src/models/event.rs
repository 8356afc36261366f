//! Seismic event record.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Format of `EventRecord::timestamp` as published by the bulletin.
pub const TIMESTAMP_FORMAT: &str = "%y/%m/%d %H:%M:%S";

/// One event as read from the bulletin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventRecord {
    /// Local date and time, `YY/MM/DD HH:MM:SS`
    pub timestamp: String,

    /// Degrees, signed
    pub latitude: f64,

    /// Degrees, signed
    pub longitude: f64,

    /// Kilometers below the surface
    pub depth: f64,

    pub magnitude: f64,

    /// Free text, the last comma-separated segment names the country
    pub location: String,

    /// Untouched source line, only ever compared for equality
    pub raw_line: String,
}

impl EventRecord {
    /// Parse `timestamp` into a calendar value.
    pub fn occurred_at(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.timestamp, TIMESTAMP_FORMAT).ok()
    }

    /// Check that every field shown on the card holds a usable value.
    pub fn validate_for_display(&self) -> Result<()> {
        let numeric = [
            ("latitude", self.latitude),
            ("longitude", self.longitude),
            ("depth", self.depth),
            ("magnitude", self.magnitude),
        ];
        for (name, value) in numeric {
            if !value.is_finite() {
                return Err(AppError::validation(format!(
                    "{name} is not a number in record '{}'",
                    self.raw_line
                )));
            }
        }
        if self.location.trim().is_empty() {
            return Err(AppError::validation(format!(
                "location is empty in record '{}'",
                self.raw_line
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn sample_event() -> EventRecord {
        EventRecord {
            timestamp: "25/08/02 19:46:37".to_string(),
            latitude: 14.02,
            longitude: -89.78,
            depth: 5.0,
            magnitude: 2.2,
            location: "13 Km al noreste de Ahuachapan, El Salvador".to_string(),
            raw_line: "raw".to_string(),
        }
    }

    #[test]
    fn test_occurred_at() {
        let at = sample_event().occurred_at().unwrap();
        assert_eq!((at.year(), at.month(), at.day()), (2025, 8, 2));
        assert_eq!((at.hour(), at.minute(), at.second()), (19, 46, 37));
    }

    #[test]
    fn test_occurred_at_malformed() {
        let mut event = sample_event();
        event.timestamp = "yesterday 19:46".to_string();
        assert!(event.occurred_at().is_none());
    }

    #[test]
    fn test_validate_for_display() {
        assert!(sample_event().validate_for_display().is_ok());

        let mut event = sample_event();
        event.depth = f64::NAN;
        assert!(matches!(
            event.validate_for_display(),
            Err(AppError::Validation(_))
        ));

        let mut event = sample_event();
        event.location = "  ".to_string();
        assert!(event.validate_for_display().is_err());
    }
}
