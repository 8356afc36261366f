//! Pipeline outputs.

use std::path::PathBuf;

use serde::Serialize;

use super::EventRecord;

/// Country and display text derived from an event's location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedLocation {
    /// Last comma-separated segment of the location, trimmed
    pub country_name: String,

    /// ISO 3166 alpha-2 code, `None` when the name is not in the table
    pub country_code: Option<&'static str>,

    /// Location with the trailing country segment removed
    pub cleaned_location: String,
}

/// A card persisted to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    /// File name relative to the output directory
    pub file_name: String,

    /// Full path on disk
    pub path: PathBuf,

    /// Encoded PNG size in bytes
    pub size: usize,
}

/// Result of rendering a new event.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    /// File name of the card, servable from the output directory
    pub image: String,
    pub magnitude: f64,
    pub location: String,
    pub depth: f64,
    pub date: String,
    pub country_name: String,
    pub country_code: &'static str,
}

impl Notification {
    pub fn new(
        event: &EventRecord,
        resolved: &ResolvedLocation,
        country_code: &'static str,
        image: &RenderedImage,
    ) -> Self {
        Self {
            image: image.file_name.clone(),
            magnitude: event.magnitude,
            location: event.location.clone(),
            depth: event.depth,
            date: event.timestamp.clone(),
            country_name: resolved.country_name.clone(),
            country_code,
        }
    }
}
