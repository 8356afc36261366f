//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Environment variable overriding `assets.map_api_key`.
pub const ENV_MAP_API_KEY: &str = "SISMO_MAP_API_KEY";
/// Environment variable overriding `source.bulletin_url`.
pub const ENV_BULLETIN_URL: &str = "SISMO_BULLETIN_URL";
/// Environment variable overriding `render.output_dir`.
pub const ENV_OUTPUT_DIR: &str = "SISMO_OUTPUT_DIR";

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Upstream bulletin settings
    #[serde(default)]
    pub source: SourceConfig,

    /// Map and flag provider settings
    #[serde(default)]
    pub assets: AssetsConfig,

    /// Card rendering and output settings
    #[serde(default)]
    pub render: RenderConfig,

    /// Webhook server settings
    #[serde(default)]
    pub server: ServerConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// Empty values are ignored so an exported-but-blank variable does not
    /// wipe a configured value.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get(ENV_MAP_API_KEY) {
            self.assets.map_api_key = key;
        }
        if let Some(url) = get(ENV_BULLETIN_URL) {
            self.source.bulletin_url = url;
        }
        if let Some(dir) = get(ENV_OUTPUT_DIR) {
            self.render.output_dir = PathBuf::from(dir);
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.source.bulletin_url)?;
        url::Url::parse(&self.assets.map_base_url)?;
        url::Url::parse(&self.assets.flag_base_url)?;

        if self.source.user_agent.trim().is_empty() {
            return Err(AppError::validation("source.user_agent is empty"));
        }
        if self.source.timeout_secs == 0 {
            return Err(AppError::validation("source.timeout_secs must be > 0"));
        }
        if self.assets.timeout_secs == 0 {
            return Err(AppError::validation("assets.timeout_secs must be > 0"));
        }
        if self.assets.map_width == 0 || self.assets.map_height == 0 {
            return Err(AppError::validation("assets.map_width/map_height must be > 0"));
        }
        if self.assets.map_scale == 0 {
            return Err(AppError::validation("assets.map_scale must be > 0"));
        }
        if self.render.output_dir.as_os_str().is_empty() {
            return Err(AppError::validation("render.output_dir is empty"));
        }
        if !self.assets.has_map_api_key() {
            log::warn!(
                "assets.map_api_key is empty, map requests will be rejected (set {})",
                ENV_MAP_API_KEY
            );
        }
        Ok(())
    }
}

/// Upstream bulletin page settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Page whose first anchor holds the latest event line
    #[serde(default = "defaults::bulletin_url")]
    pub bulletin_url: String,

    /// Skip TLS certificate validation for the bulletin host
    #[serde(default = "defaults::accept_invalid_certs")]
    pub accept_invalid_certs: bool,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::source_timeout")]
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            bulletin_url: defaults::bulletin_url(),
            accept_invalid_certs: defaults::accept_invalid_certs(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::source_timeout(),
        }
    }
}

/// Map tile and flag icon provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetsConfig {
    /// Static map endpoint
    #[serde(default = "defaults::map_base_url")]
    pub map_base_url: String,

    /// API key appended to map requests
    #[serde(default)]
    pub map_api_key: String,

    #[serde(default = "defaults::map_zoom")]
    pub map_zoom: u8,

    /// Requested map size before scaling
    #[serde(default = "defaults::map_width")]
    pub map_width: u32,

    #[serde(default = "defaults::map_height")]
    pub map_height: u32,

    #[serde(default = "defaults::map_scale")]
    pub map_scale: u8,

    #[serde(default = "defaults::map_type")]
    pub map_type: String,

    /// Flag icon endpoint, codes are appended as path segments
    #[serde(default = "defaults::flag_base_url")]
    pub flag_base_url: String,

    #[serde(default = "defaults::flag_style")]
    pub flag_style: String,

    #[serde(default = "defaults::flag_size")]
    pub flag_size: u32,

    /// Request timeout in seconds for both providers
    #[serde(default = "defaults::assets_timeout")]
    pub timeout_secs: u64,
}

impl AssetsConfig {
    /// Whether a non-blank map API key is configured.
    pub fn has_map_api_key(&self) -> bool {
        !self.map_api_key.trim().is_empty()
    }
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            map_base_url: defaults::map_base_url(),
            map_api_key: String::new(),
            map_zoom: defaults::map_zoom(),
            map_width: defaults::map_width(),
            map_height: defaults::map_height(),
            map_scale: defaults::map_scale(),
            map_type: defaults::map_type(),
            flag_base_url: defaults::flag_base_url(),
            flag_style: defaults::flag_style(),
            flag_size: defaults::flag_size(),
            timeout_secs: defaults::assets_timeout(),
        }
    }
}

/// Card rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Directory receiving `sismo_<millis>.png` files, also served over HTTP
    #[serde(default = "defaults::output_dir")]
    pub output_dir: PathBuf,

    #[serde(default)]
    pub fonts: FontPaths,

    /// Text drawn on the attribution bar
    #[serde(default = "defaults::attribution")]
    pub attribution: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            output_dir: defaults::output_dir(),
            fonts: FontPaths::default(),
            attribution: defaults::attribution(),
        }
    }
}

/// TTF files for the three faces used on the card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontPaths {
    #[serde(default = "defaults::font_regular")]
    pub regular: PathBuf,

    #[serde(default = "defaults::font_bold")]
    pub bold: PathBuf,

    #[serde(default = "defaults::font_black")]
    pub black: PathBuf,
}

impl Default for FontPaths {
    fn default() -> Self {
        Self {
            regular: defaults::font_regular(),
            bold: defaults::font_bold(),
            black: defaults::font_black(),
        }
    }
}

/// Webhook server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "defaults::bind_addr")]
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: defaults::bind_addr(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Source defaults
    pub fn bulletin_url() -> String {
        "https://webserver2.ineter.gob.ni/geofisica/sis/events/sismos.php".into()
    }
    pub fn accept_invalid_certs() -> bool {
        true
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; sismo/0.1)".into()
    }
    pub fn source_timeout() -> u64 {
        15
    }

    // Asset provider defaults
    pub fn map_base_url() -> String {
        "https://maps.googleapis.com/maps/api/staticmap".into()
    }
    pub fn map_zoom() -> u8 {
        9
    }
    pub fn map_width() -> u32 {
        600
    }
    pub fn map_height() -> u32 {
        250
    }
    pub fn map_scale() -> u8 {
        2
    }
    pub fn map_type() -> String {
        "hybrid".into()
    }
    pub fn flag_base_url() -> String {
        "https://flagsapi.com".into()
    }
    pub fn flag_style() -> String {
        "flat".into()
    }
    pub fn flag_size() -> u32 {
        64
    }
    pub fn assets_timeout() -> u64 {
        20
    }

    // Render defaults
    pub fn output_dir() -> PathBuf {
        PathBuf::from("public")
    }
    pub fn attribution() -> String {
        "Hecho por Cheskodev".into()
    }
    pub fn font_regular() -> PathBuf {
        PathBuf::from("static/Figtree.ttf")
    }
    pub fn font_bold() -> PathBuf {
        PathBuf::from("static/Figtree-Bold.ttf")
    }
    pub fn font_black() -> PathBuf {
        PathBuf::from("static/Figtree-Black.ttf")
    }

    // Server defaults
    pub fn bind_addr() -> String {
        "0.0.0.0:3000".into()
    }
}
