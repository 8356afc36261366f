// src/services/fetcher.rs

//! Bulletin page fetcher.
//!
//! The bulletin lists events newest first, one per hyperlink, so the first
//! `<a>` in document order carries the latest event line.

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};

use crate::error::{AppError, Result};
use crate::models::SourceConfig;
use crate::utils::http;

/// Anything able to produce the latest raw bulletin line.
#[async_trait]
pub trait BulletinSource: Send + Sync {
    async fn latest_line(&self) -> Result<String>;
}

/// Fetches the latest line from the live bulletin page.
pub struct BulletinFetcher {
    client: Client,
    url: String,
}

impl BulletinFetcher {
    /// Create a fetcher with its own client honouring the trust override.
    pub fn new(config: &SourceConfig) -> Result<Self> {
        Ok(Self {
            client: http::create_source_client(config)?,
            url: config.bulletin_url.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl BulletinSource for BulletinFetcher {
    async fn latest_line(&self) -> Result<String> {
        log::debug!("Fetching bulletin from {}", self.url);
        let document = http::fetch_page_async(&self.client, &self.url).await?;
        first_anchor_text(&document)?
            .ok_or_else(|| AppError::fetch(&self.url, "no hyperlink with text on bulletin page"))
    }
}

/// Trimmed text of the first hyperlink, `None` when there is no usable one.
pub fn first_anchor_text(document: &Html) -> Result<Option<String>> {
    let anchor = parse_selector("a")?;
    let text = document
        .select(&anchor)
        .next()
        .map(|a| a.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty());
    Ok(text)
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}
