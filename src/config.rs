//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use crate::storage::StoreConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Record store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_database_path")]
    pub database_path: String,

    #[serde(default)]
    pub table_prefix: String,

    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,
}

fn default_database_path() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("reqlog").join("reqlog.db").to_string_lossy().to_string())
        .unwrap_or_else(|| "./reqlog_data/reqlog.db".to_string())
}

fn default_busy_timeout() -> u64 {
    5000 // 5 seconds
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            table_prefix: String::new(),
            busy_timeout_ms: default_busy_timeout(),
        }
    }
}

impl StorageConfig {
    /// Runtime store configuration
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            database_path: PathBuf::from(&self.database_path),
            table_prefix: self.table_prefix.clone(),
            busy_timeout: Duration::from_millis(self.busy_timeout_ms),
        }
    }
}

/// Change token and query cache configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_group")]
    pub group: String,

    #[serde(default)]
    pub cache_queries: bool,
}

fn default_cache_group() -> String {
    "api_request_logs".to_string()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            group: default_cache_group(),
            cache_queries: false,
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

        Self::parse(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
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

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("reqlog").join("config.toml")),
            Some(PathBuf::from("/etc/reqlog/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        // Storage overrides
        if let Some(path) = var("REQLOG_DATABASE_PATH") {
            self.storage.database_path = path;
        }
        if let Some(prefix) = var("REQLOG_TABLE_PREFIX") {
            self.storage.table_prefix = prefix;
        }

        // Cache overrides
        if let Some(group) = var("REQLOG_CACHE_GROUP") {
            self.cache.group = group;
        }

        // Logging overrides
        if let Some(level) = var("REQLOG_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("REQLOG_LOG_FORMAT") {
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
    r#"# Reqlog Configuration
#
# Environment variables override these settings:
# - REQLOG_DATABASE_PATH
# - REQLOG_TABLE_PREFIX
# - REQLOG_CACHE_GROUP
# - REQLOG_LOG_LEVEL
# - REQLOG_LOG_FORMAT

[storage]
# SQLite database file
database_path = "~/.local/share/reqlog/reqlog.db"

# Prepended to the table name (e.g. "wp_" gives wp_api_request_logs)
table_prefix = ""

# How long a statement waits on a locked database (ms)
busy_timeout_ms = 5000

[cache]
# Cache group holding the last_changed token
group = "api_request_logs"

# Memoize get_logs/count results keyed by the change token
cache_queries = false

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"

# Optional log file path
# file = "/var/log/reqlog/reqlog.log"
"#
    .to_string()
}
