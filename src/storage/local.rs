//! Local filesystem storage implementation.
//!
//! Cards are written next to each other in one directory that the webhook
//! server also exposes as static files.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::RenderedImage;
use crate::storage::{ImageStorage, card_file_name};
use crate::utils::now_millis;

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalImageStorage {
    root_dir: PathBuf,
}

impl LocalImageStorage {
    /// Create a new LocalImageStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        let tmp = path.with_extension("tmp");
        if let Err(e) = write_then_rename(&tmp, path, bytes).await {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp).await {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    log::warn!("Failed to remove partial card {}: {}", tmp.display(), cleanup);
                }
            }
            return Err(AppError::Io(e));
        }
        Ok(())
    }

    /// First `sismo_<millis>.png` name not already taken.
    async fn free_file_name(&self) -> Result<(String, PathBuf)> {
        let mut millis = now_millis();
        loop {
            let name = card_file_name(millis);
            let path = self.root_dir.join(&name);
            if !tokio::fs::try_exists(&path).await? {
                return Ok((name, path));
            }
            millis += 1;
        }
    }
}

async fn write_then_rename(tmp: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(tmp).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    drop(file);
    tokio::fs::rename(tmp, path).await
}

#[async_trait]
impl ImageStorage for LocalImageStorage {
    async fn save(&self, png: &[u8]) -> Result<RenderedImage> {
        tokio::fs::create_dir_all(&self.root_dir).await?;

        let (file_name, path) = self.free_file_name().await?;
        self.write_bytes(&path, png).await?;
        log::info!("Card written to {} ({} bytes)", path.display(), png.len());

        Ok(RenderedImage {
            file_name,
            path,
            size: png.len(),
        })
    }

    async fn remove(&self, path: &Path) -> Result<()> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                log::info!("Deleted old card {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}
