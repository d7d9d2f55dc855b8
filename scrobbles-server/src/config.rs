use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const CONFIG_PATH_ENV: &str = "SCROBBLES_CONFIG";
pub const API_KEY_ENV: &str = "LASTFM_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_lastfm_api_url")]
    pub lastfm_api_url: String,

    /// The only upstream credential. Overridden by `LASTFM_API_KEY`.
    #[serde(default)]
    pub lastfm_api_key: Option<String>,

    /// Username shown when the page is requested without one
    #[serde(default = "default_username")]
    pub default_username: String,

    /// Directory served under `/assets`
    #[serde(default = "default_assets_dir")]
    pub assets_dir: String,

    /// Local font file, tried first
    #[serde(default = "default_font_path")]
    pub font_path: String,

    /// Font path relative to the service origin, tried second
    #[serde(default = "default_font_asset_path")]
    pub font_asset_path: String,

    /// Public origin (e.g. "https://scrobbles.today"). Page links fall back to
    /// the Host header; the bundled font falls back to the bind address.
    #[serde(default)]
    pub public_url: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_lastfm_api_url() -> String {
    "http://ws.audioscrobbler.com/2.0/".to_string()
}

fn default_username() -> String {
    "datejer".to_string()
}

fn default_assets_dir() -> String {
    "assets".to_string()
}

fn default_font_path() -> String {
    "assets/subset-Inter-Bold.ttf".to_string()
}

fn default_font_asset_path() -> String {
    "/assets/subset-Inter-Bold.ttf".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_dir: default_log_dir(),
            lastfm_api_url: default_lastfm_api_url(),
            lastfm_api_key: None,
            default_username: default_username(),
            assets_dir: default_assets_dir(),
            font_path: default_font_path(),
            font_asset_path: default_font_asset_path(),
            public_url: None,
        }
    }
}

impl ServerConfig {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: ServerConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file: {}", e))?;
        Ok(config)
    }

    /// Load from `SCROBBLES_CONFIG` (or `config.toml`), falling back to
    /// defaults when the file does not exist, then apply `LASTFM_API_KEY`.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let config = if Path::new(&path).exists() {
            Self::from_file(&path)?
        } else {
            tracing::warn!("Config file {} not found, using defaults", path);
            Self::default()
        };

        Ok(config.with_api_key_override(std::env::var(API_KEY_ENV).ok()))
    }

    pub fn with_api_key_override(mut self, key: Option<String>) -> Self {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.lastfm_api_key = Some(key);
        }
        self
    }

    /// The configured key, treating blank values as absent
    pub fn api_key(&self) -> Option<String> {
        self.lastfm_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Origin this process answers on, with wildcard hosts mapped to loopback
    pub fn local_origin(&self) -> String {
        let host = match self.host.as_str() {
            "0.0.0.0" | "" => "127.0.0.1",
            "::" | "[::]" => "[::1]",
            other => other,
        };
        format!("http://{}:{}", host, self.port)
    }

    /// Trusted origin for server-side fetches of our own assets. Never
    /// derived from request headers.
    pub fn asset_origin(&self) -> String {
        match &self.public_url {
            Some(url) if !url.trim().is_empty() => url.trim().trim_end_matches('/').to_string(),
            _ => self.local_origin(),
        }
    }
}
