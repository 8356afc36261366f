// src/services/resolver.rs

//! Country and location resolution.
//!
//! The bulletin always ends a location with the country name as its own
//! comma-separated segment, e.g. `13 Km al noreste de Ahuachapan, El Salvador`.
//! Only the countries in [`COUNTRY_CODES`] have a code; anything else is a
//! lookup miss that the caller must handle.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{AppError, Result};
use crate::models::ResolvedLocation;

/// Display name to ISO 3166 alpha-2 code.
pub const COUNTRY_CODES: &[(&str, &str)] = &[
    ("Belize", "BZ"),
    ("Costa Rica", "CR"),
    ("El Salvador", "SV"),
    ("Guatemala", "GT"),
    ("Honduras", "HN"),
    ("Nicaragua", "NI"),
    ("Panama", "PA"),
];

/// Look up the code for a country display name (exact match).
pub fn country_code(name: &str) -> Option<&'static str> {
    COUNTRY_CODES
        .iter()
        .find(|(country, _)| *country == name)
        .map(|(_, code)| *code)
}

/// Split a location into its country and the remaining description.
pub fn resolve_location(location: &str) -> ResolvedLocation {
    let country_name = location
        .rsplit(',')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string();

    ResolvedLocation {
        country_code: country_code(&country_name),
        cleaned_location: strip_country_suffix(location),
        country_name,
    }
}

/// Code of a resolved location, failing on a lookup miss.
pub fn require_country_code(resolved: &ResolvedLocation) -> Result<&'static str> {
    resolved
        .country_code
        .ok_or_else(|| AppError::AssetLookup(resolved.country_name.clone()))
}

/// Remove a trailing `, <segment>` from a location.
fn strip_country_suffix(location: &str) -> String {
    static SUFFIX: OnceLock<Regex> = OnceLock::new();
    let suffix = SUFFIX.get_or_init(|| Regex::new(r",\s*[^,]+$").expect("suffix pattern is valid"));
    suffix.replace(location, "").into_owned()
}
