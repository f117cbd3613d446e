//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and `ANSURYX_*` environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::storage::StorageBackend;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_data_dir() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("ansuryx").to_string_lossy().to_string())
        .unwrap_or_else(|| "./ansuryx_data".to_string())
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            data_dir: default_data_dir(),
        }
    }
}

impl StorageConfig {
    /// Data directory with a leading `~` expanded
    pub fn data_path(&self) -> PathBuf {
        match self.data_dir.strip_prefix("~/") {
            Some(rest) => dirs::home_dir()
                .map(|home| home.join(rest))
                .unwrap_or_else(|| PathBuf::from(&self.data_dir)),
            None => PathBuf::from(&self.data_dir),
        }
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_enable_export")]
    pub enable_export: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8040
}

fn default_enable_export() -> bool {
    true
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:5173".to_string(),
            ],
            enable_export: default_enable_export(),
        }
    }
}

/// Session configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_session_ttl")]
    pub session_ttl_hours: i64,

    #[serde(default = "default_purge_interval")]
    pub purge_interval_minutes: u64,
}

/// Longest session lifetime accepted from config (ten years)
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 366 * 10;

/// Longest gap between expired-session sweeps (one week)
pub const MAX_PURGE_INTERVAL_MINUTES: u64 = 60 * 24 * 7;

fn default_session_ttl() -> i64 {
    24 * 7
}

/// Session lifetime for `hours`, or `None` outside `1..=MAX_SESSION_TTL_HOURS`
pub fn session_ttl(hours: i64) -> Option<chrono::Duration> {
    if !(1..=MAX_SESSION_TTL_HOURS).contains(&hours) {
        return None;
    }
    chrono::Duration::try_hours(hours)
}

fn default_purge_interval() -> u64 {
    60
}

impl AuthConfig {
    fn validate(&self) -> Result<(), String> {
        if session_ttl(self.session_ttl_hours).is_none() {
            return Err(format!(
                "auth.session_ttl_hours must be between 1 and {}, got {}",
                MAX_SESSION_TTL_HOURS, self.session_ttl_hours
            ));
        }
        if !(1..=MAX_PURGE_INTERVAL_MINUTES).contains(&self.purge_interval_minutes) {
            return Err(format!(
                "auth.purge_interval_minutes must be between 1 and {}, got {}",
                MAX_PURGE_INTERVAL_MINUTES, self.purge_interval_minutes
            ));
        }
        Ok(())
    }

    /// Interval between expired-session sweeps
    pub fn purge_interval(&self) -> std::time::Duration {
        let minutes = self
            .purge_interval_minutes
            .clamp(1, MAX_PURGE_INTERVAL_MINUTES);
        std::time::Duration::from_secs(minutes.saturating_mul(60))
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_hours: default_session_ttl(),
            purge_interval_minutes: default_purge_interval(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,

    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    fn parse(content: &str) -> Result<Self, String> {
        let config: Self = toml::from_str(content).map_err(|e| e.to_string())?;
        config.auth.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Default config file locations, in search order
    pub fn search_paths() -> Vec<PathBuf> {
        [
            dirs::config_dir().map(|p| p.join("ansuryx").join("config.toml")),
            Some(PathBuf::from("/etc/ansuryx/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        for path in Self::search_paths() {
            if path.exists() {
                match Self::load_with_env(&path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply `ANSURYX_*` overrides read through `var`
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(backend) = var("ANSURYX_STORAGE_BACKEND") {
            match backend.parse() {
                Ok(b) => self.storage.backend = b,
                Err(e) => tracing::warn!("Ignoring ANSURYX_STORAGE_BACKEND: {}", e),
            }
        }
        if let Some(data_dir) = var("ANSURYX_DATA_DIR") {
            self.storage.data_dir = data_dir;
        }

        if let Some(host) = var("ANSURYX_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = var("ANSURYX_API_PORT") {
            if let Ok(p) = port.parse() {
                self.api.port = p;
            }
        }

        if let Some(ttl) = var("ANSURYX_SESSION_TTL_HOURS") {
            match ttl.parse::<i64>() {
                Ok(hours) if session_ttl(hours).is_some() => self.auth.session_ttl_hours = hours,
                _ => tracing::warn!(
                    "Ignoring ANSURYX_SESSION_TTL_HOURS={}: expected 1 to {} hours",
                    ttl,
                    MAX_SESSION_TTL_HOURS
                ),
            }
        }

        if let Some(level) = var("ANSURYX_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("ANSURYX_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# AnsuryX Configuration
#
# Environment variables override these settings:
# - ANSURYX_STORAGE_BACKEND
# - ANSURYX_DATA_DIR
# - ANSURYX_API_HOST
# - ANSURYX_API_PORT
# - ANSURYX_SESSION_TTL_HOURS
# - ANSURYX_LOG_LEVEL
# - ANSURYX_LOG_FORMAT

[storage]
# Backend: sqlite (database file) or demo (single JSON document)
backend = "sqlite"

# Directory for data files
data_dir = "~/.local/share/ansuryx"

[api]
# API server host
host = "127.0.0.1"

# API server port
port = 8040

# Allowed CORS origins (empty allows any origin)
cors_origins = ["http://localhost:5173", "http://127.0.0.1:5173"]

# Enable journal export downloads
enable_export = true

[auth]
# How long a sign-in stays valid (hours)
session_ttl_hours = 168

# How often expired sessions are purged (minutes)
purge_interval_minutes = 60

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"

# Optional log file path
# file = "/var/log/ansuryx/ansuryx.log"
"#
    .to_string()
}
