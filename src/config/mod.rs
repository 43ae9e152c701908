use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Base URL the API is reachable at, used to absolutize media paths
    #[serde(default = "default_public_url")]
    pub public_url: String,
    /// Directory served under `/media`
    #[serde(default = "default_media_dir")]
    pub media_dir: PathBuf,
    /// Allowed CORS origins. Empty allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            data_dir: default_data_dir(),
            public_url: default_public_url(),
            media_dir: default_media_dir(),
            cors_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Prefix a stored media path with the public URL.
    ///
    /// Absolute URLs and empty strings are returned unchanged.
    pub fn media_url(&self, path: &str) -> String {
        if path.is_empty() || path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let base = self.public_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        if path.starts_with("media/") {
            format!("{}/{}", base, path)
        } else {
            format!("{}/media/{}", base, path)
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4000
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_public_url() -> String {
    "http://localhost:4000".to_string()
}

fn default_media_dir() -> PathBuf {
    PathBuf::from("./data/media")
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// Bearer token required on admin routes. Admin routes are open when unset.
    pub admin_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_rate_limit_enabled")]
    pub enabled: bool,
    /// Requests per window for guest-facing routes
    #[serde(default = "default_public_requests_per_window")]
    pub public_requests_per_window: u32,
    /// Requests per window for admin routes
    #[serde(default = "default_admin_requests_per_window")]
    pub admin_requests_per_window: u32,
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,
    /// Seconds between sweeps of stale limiter entries
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_rate_limit_enabled(),
            public_requests_per_window: default_public_requests_per_window(),
            admin_requests_per_window: default_admin_requests_per_window(),
            window_seconds: default_window_seconds(),
            cleanup_interval: default_cleanup_interval(),
        }
    }
}

fn default_rate_limit_enabled() -> bool {
    true
}

fn default_public_requests_per_window() -> u32 {
    60
}

fn default_admin_requests_per_window() -> u32 {
    600
}

fn default_window_seconds() -> u64 {
    60
}

fn default_cleanup_interval() -> u64 {
    300
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::from_toml(&content)
        } else {
            info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| "Failed to parse configuration file")
    }
}
