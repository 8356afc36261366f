// src/models/mod.rs

//! Domain models for the bulletin watcher.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod event;
mod notification;

// Re-export all public types
pub use config::{AssetsConfig, Config, FontPaths, RenderConfig, ServerConfig, SourceConfig};
pub use event::EventRecord;
pub use notification::{Notification, RenderedImage, ResolvedLocation};
