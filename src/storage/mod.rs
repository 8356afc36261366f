//! Storage abstractions for rendered cards.
//!
//! ## Directory Structure
//!
//! ```text
//! public/
//! ├── sismo_1754185597123.png   # Latest card, served over HTTP
//! └── sismo_1754185597123.tmp   # Only while a write is in flight
//! ```

pub mod local;

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::RenderedImage;

// Re-export for convenience
pub use local::LocalImageStorage;

/// Prefix of every card file name.
pub const FILE_PREFIX: &str = "sismo_";

/// Card file name for a millisecond timestamp.
pub fn card_file_name(epoch_millis: i64) -> String {
    format!("{FILE_PREFIX}{epoch_millis}.png")
}

/// Trait for card storage backends.
#[async_trait]
pub trait ImageStorage: Send + Sync {
    /// Persist an encoded card under a fresh `sismo_<millis>.png` name.
    ///
    /// Either the complete file exists afterwards or nothing does.
    async fn save(&self, png: &[u8]) -> Result<RenderedImage>;

    /// Delete a previously saved card. A missing file is not an error.
    async fn remove(&self, path: &Path) -> Result<()>;
}
