// src/services/parser.rs

//! Bulletin record parser.
//!
//! A bulletin line is a run of whitespace-separated tokens:
//!
//! ```text
//! 25/08/02 19:46:37 14.020 -89.780 5 2.2 C 13 Km al noreste de Ahuachapan, El Salvador
//! └ date ┘ └ time ┘ └ lat ┘ └ lon ┘ │ └mag│ └──────────── location ───────────────────┘
//!                                 depth  marker
//! ```
//!
//! At least [`MIN_TOKENS`] tokens are required. Numeric fields that do not
//! start with a number become `NaN` instead of failing the whole record.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{AppError, Result};
use crate::models::EventRecord;

/// Date, time, four numbers, the marker and at least one location word.
pub const MIN_TOKENS: usize = 8;

const DATE: usize = 0;
const TIME: usize = 1;
const LATITUDE: usize = 2;
const LONGITUDE: usize = 3;
const DEPTH: usize = 4;
const MAGNITUDE: usize = 5;
const LOCATION_START: usize = 7;

/// Parse one bulletin line into an event.
pub fn parse_record(line: &str) -> Result<EventRecord> {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    if tokens.is_empty() {
        return Err(AppError::parse("empty record"));
    }
    if tokens.len() < MIN_TOKENS {
        return Err(AppError::parse(format!(
            "expected at least {MIN_TOKENS} tokens, found {} in '{}'",
            tokens.len(),
            line.trim()
        )));
    }

    Ok(EventRecord {
        timestamp: format!("{} {}", tokens[DATE], tokens[TIME]),
        latitude: parse_float_prefix(tokens[LATITUDE]),
        longitude: parse_float_prefix(tokens[LONGITUDE]),
        depth: parse_float_prefix(tokens[DEPTH]),
        magnitude: parse_float_prefix(tokens[MAGNITUDE]),
        location: tokens[LOCATION_START..].join(" "),
        raw_line: line.to_string(),
    })
}

/// Parse the longest numeric prefix of a token, `NaN` if there is none.
///
/// `"5"` → 5, `"5km"` → 5, `"-89.780"` → -89.78, `"N/A"` → NaN.
pub fn parse_float_prefix(token: &str) -> f64 {
    static NUMBER: OnceLock<Regex> = OnceLock::new();
    let number = NUMBER.get_or_init(|| {
        Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?")
            .expect("numeric prefix pattern is valid")
    });

    let token = token.trim();
    if let Some(m) = number.find(token) {
        return m.as_str().parse().unwrap_or(f64::NAN);
    }

    match token.strip_prefix('-') {
        Some(rest) if rest.starts_with("Infinity") => f64::NEG_INFINITY,
        _ if token.trim_start_matches('+').starts_with("Infinity") => f64::INFINITY,
        _ => f64::NAN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str =
        "25/08/02 19:46:37 14.020 -89.780 5 2.2 C 13 Km al noreste de Ahuachapan, El Salvador";

    #[test]
    fn test_parse_sample_record() {
        let event = parse_record(SAMPLE).unwrap();

        assert_eq!(event.timestamp, "25/08/02 19:46:37");
        assert_eq!(event.latitude, 14.020);
        assert_eq!(event.longitude, -89.780);
        assert_eq!(event.depth, 5.0);
        assert_eq!(event.magnitude, 2.2);
        assert_eq!(event.location, "13 Km al noreste de Ahuachapan, El Salvador");
        assert_eq!(event.raw_line, SAMPLE);
    }

    #[test]
    fn test_collapses_whitespace_runs() {
        let line = "25/08/03  01:02:03\t11.5  -86.1 33.4   4.1 C  Frente a   Masachapa,  Nicaragua";
        let event = parse_record(line).unwrap();

        assert_eq!(event.timestamp, "25/08/03 01:02:03");
        assert_eq!(event.depth, 33.4);
        assert_eq!(event.location, "Frente a Masachapa, Nicaragua");
        assert_eq!(event.raw_line, line);
    }

    #[test]
    fn test_fields_match_tokens() {
        let lines = [
            "24/12/31 23:59:59 0 0 0 0 C X",
            "25/01/01 00:00:00 -1.5 179.99 120 6.8 C Lejos, Panama",
            "25/03/10 08:15:00 12.345 -87.001 10 3 M Golfo de Fonseca, Honduras",
        ];
        for line in lines {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            let event = parse_record(line).unwrap();

            assert_eq!(event.timestamp, format!("{} {}", tokens[0], tokens[1]));
            assert_eq!(event.latitude, tokens[2].parse::<f64>().unwrap());
            assert_eq!(event.longitude, tokens[3].parse::<f64>().unwrap());
            assert_eq!(event.depth, tokens[4].parse::<f64>().unwrap());
            assert_eq!(event.magnitude, tokens[5].parse::<f64>().unwrap());
            assert_eq!(event.location, tokens[7..].join(" "));
        }
    }

    #[test]
    fn test_non_numeric_fields_become_nan() {
        let event = parse_record("25/08/02 19:46:37 lat -89.78 ? 2.2 C Somewhere, Guatemala").unwrap();
        assert!(event.latitude.is_nan());
        assert!(event.depth.is_nan());
        assert_eq!(event.longitude, -89.78);
    }

    #[test]
    fn test_empty_record_rejected() {
        assert!(matches!(parse_record(""), Err(AppError::Parse(_))));
        assert!(matches!(parse_record("  \t "), Err(AppError::Parse(_))));
    }

    #[test]
    fn test_short_record_rejected() {
        let err = parse_record("25/08/02 19:46:37 14.020 -89.780 5 2.2 C").unwrap_err();
        match err {
            AppError::Parse(message) => assert!(message.contains("found 7")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_float_prefix() {
        assert_eq!(parse_float_prefix("5"), 5.0);
        assert_eq!(parse_float_prefix("5km"), 5.0);
        assert_eq!(parse_float_prefix("-89.780"), -89.78);
        assert_eq!(parse_float_prefix("+.5"), 0.5);
        assert_eq!(parse_float_prefix("1e2"), 100.0);
        assert_eq!(parse_float_prefix("-Infinity"), f64::NEG_INFINITY);
        assert!(parse_float_prefix("N/A").is_nan());
        assert!(parse_float_prefix("").is_nan());
    }
}
