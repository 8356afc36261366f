//! Service layer for the bulletin watcher.
//!
//! This module contains the business logic for:
//! - Bulletin fetching (`BulletinFetcher`)
//! - Record parsing (`parse_record`)
//! - Change detection (`ChangeGate`)
//! - Country resolution (`resolve_location`)
//! - Map and flag providers (`HttpAssetSource`)
//! - Card composition (`CardComposer`, `FontBook`)

pub mod composer;
mod fetcher;
mod fonts;
mod gate;
mod parser;
mod providers;
mod resolver;

pub use composer::{CardComposer, CardContent, CardLayout, TextRenderer, TextSpec};
pub use fetcher::{BulletinFetcher, BulletinSource, first_anchor_text};
pub use fonts::FontBook;
pub use gate::{ChangeGate, GateDecision, GateGuard, GateState};
pub use parser::{MIN_TOKENS, parse_float_prefix, parse_record};
pub use providers::{AssetSource, HttpAssetSource};
pub use resolver::{COUNTRY_CODES, country_code, require_country_code, resolve_location};
