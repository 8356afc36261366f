// src/services/providers.rs

//! Map tile and flag icon providers.

use async_trait::async_trait;
use reqwest::Client;

use crate::error::Result;
use crate::models::AssetsConfig;
use crate::utils::http;

/// Source of the raster assets placed on a card.
#[async_trait]
pub trait AssetSource: Send + Sync {
    /// Encoded map image centred on the given coordinates.
    async fn map_tile(&self, latitude: f64, longitude: f64) -> Result<Vec<u8>>;

    /// Encoded flag image for an ISO alpha-2 country code.
    async fn flag(&self, country_code: &str) -> Result<Vec<u8>>;
}

/// Static map and flag icon HTTP APIs.
pub struct HttpAssetSource {
    client: Client,
    config: AssetsConfig,
}

impl HttpAssetSource {
    pub fn new(config: AssetsConfig, user_agent: &str) -> Result<Self> {
        Ok(Self {
            client: http::create_assets_client(&config, user_agent)?,
            config,
        })
    }

    /// Static map URL with a red `E` marker on the epicentre.
    pub fn map_url(&self, latitude: f64, longitude: f64) -> String {
        let c = &self.config;
        format!(
            "{base}?center={latitude},{longitude}&zoom={zoom}&format=png&scale={scale}\
             &size={w}x{h}&markers=color:red%7Clabel:E%7C{latitude},{longitude}\
             &maptype={map_type}&key={key}",
            base = c.map_base_url,
            zoom = c.map_zoom,
            scale = c.map_scale,
            w = c.map_width,
            h = c.map_height,
            map_type = c.map_type,
            key = c.map_api_key,
        )
    }

    pub fn flag_url(&self, country_code: &str) -> String {
        format!(
            "{}/{}/{}/{}.png",
            self.config.flag_base_url.trim_end_matches('/'),
            country_code,
            self.config.flag_style,
            self.config.flag_size
        )
    }
}

#[async_trait]
impl AssetSource for HttpAssetSource {
    async fn map_tile(&self, latitude: f64, longitude: f64) -> Result<Vec<u8>> {
        log::debug!("Fetching map tile for {latitude},{longitude}");
        let url = self.map_url(latitude, longitude);
        http::fetch_bytes(&self.client, "map tile", &url).await
    }

    async fn flag(&self, country_code: &str) -> Result<Vec<u8>> {
        log::debug!("Fetching flag for {country_code}");
        let url = self.flag_url(country_code);
        http::fetch_bytes(&self.client, &format!("flag {country_code}"), &url).await
    }
}
