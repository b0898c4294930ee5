//! Configuration for the screener.
//!
//! The configuration file lives at `~/.ashare-screener/config.json`. A missing
//! file is not an error: every field has a default.
//!
//! # Configuration Priority
//!
//! 1. Environment variables (SCREENER_* prefix)
//! 2. Explicit config file values
//! 3. Default values
//!
//! # Environment Variable Mapping
//!
//! - `SCREENER_LOG_LEVEL` → observability.log_level
//! - `SCREENER_LOG_FORMAT` → observability.log_format
//! - `SCREENER_CACHE_DIR` → data.cache_dir
//! - `SCREENER_DEFAULT_SCOPE` → screener.default_scope

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".ashare-screener"),
        |dirs| dirs.home_dir().join(".ashare-screener"),
    )
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), directories::UserDirs::new()) {
        (Some(rest), Some(dirs)) => dirs.home_dir().join(rest),
        _ => PathBuf::from(path),
    }
}

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Logging configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Defaults for the `screen` command
    #[serde(default)]
    pub screener: ScreenerDefaults,

    /// Data acquisition and cache settings
    #[serde(default)]
    pub data: DataConfig,
}

impl Config {
    /// Load configuration from the default path, falling back to defaults.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config from {}: {}", path.display(), e))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            Error::Config(format!("Failed to parse config from {}: {}", path.display(), e))
        })
    }

    /// Load configuration with environment variable overrides applied.
    pub fn load_with_env() -> Result<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(level) = lookup("SCREENER_LOG_LEVEL") {
            self.observability.log_level = level;
        }
        if let Some(format) = lookup("SCREENER_LOG_FORMAT") {
            self.observability.log_format = format;
        }
        if let Some(dir) = lookup("SCREENER_CACHE_DIR") {
            self.data.cache_dir = dir;
        }
        if let Some(scope) = lookup("SCREENER_DEFAULT_SCOPE") {
            self.screener.default_scope = scope;
        }
    }
}

// ============================================================================
// Observability
// ============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level", alias = "level")]
    pub log_level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format", alias = "format")]
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

// ============================================================================
// Screener Defaults
// ============================================================================

/// Defaults applied when the CLI leaves a `screen` option unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenerDefaults {
    /// Scope token (all, hs300, zz500, zz1000, cyb, kcb, custom:...)
    #[serde(default = "default_scope")]
    pub default_scope: String,

    /// Sort key (score, pe, pb, market_cap)
    #[serde(default = "default_sort")]
    pub default_sort: String,

    /// Number of rows to keep (0 keeps everything)
    #[serde(default = "default_top")]
    pub default_top: usize,
}

impl Default for ScreenerDefaults {
    fn default() -> Self {
        Self {
            default_scope: default_scope(),
            default_sort: default_sort(),
            default_top: default_top(),
        }
    }
}

fn default_scope() -> String {
    "hs300".to_string()
}

fn default_sort() -> String {
    "score".to_string()
}

fn default_top() -> usize {
    50
}

// ============================================================================
// Data Configuration
// ============================================================================

/// Data acquisition and cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory for the per-stock document cache (`~/` is expanded)
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,

    /// Whether `fetch` reads and writes the cache by default
    #[serde(default = "default_true")]
    pub cache_enabled: bool,

    /// HTTP request timeout
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Attempts per provider call (including the first)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base retry delay; the pause after failed attempt `n` (0-based) is
    /// `(n + 1) * retry_delay_ms`
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Pause between consecutive per-stock fetches
    #[serde(default = "default_request_interval_ms")]
    pub request_interval_ms: u64,

    /// Rows per page when paging the spot snapshot
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl DataConfig {
    /// Cache directory with `~/` expanded.
    pub fn cache_path(&self) -> PathBuf {
        expand_home(&self.cache_dir)
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            cache_enabled: true,
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            request_interval_ms: default_request_interval_ms(),
            page_size: default_page_size(),
        }
    }
}

fn default_cache_dir() -> String {
    "~/.ashare-screener/cache".to_string()
}

fn default_true() -> bool {
    true
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    2000
}

fn default_request_interval_ms() -> u64 {
    500
}

fn default_page_size() -> usize {
    100
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.observability.log_level, "info");
        assert_eq!(config.screener.default_scope, "hs300");
        assert_eq!(config.screener.default_sort, "score");
        assert_eq!(config.screener.default_top, 50);
        assert_eq!(config.data.max_retries, 3);
        assert!(config.data.cache_enabled);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"screener": {"default_top": 10}}"#).unwrap();
        assert_eq!(config.screener.default_top, 10);
        assert_eq!(config.screener.default_sort, "score");
        assert_eq!(config.data.page_size, 100);
    }

    #[test]
    fn test_observability_aliases() {
        let config: Config =
            serde_json::from_str(r#"{"observability": {"level": "debug", "format": "json"}}"#)
                .unwrap();
        assert_eq!(config.observability.log_level, "debug");
        assert_eq!(config.observability.log_format, "json");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"data": {"cache_dir": "/tmp/screener-cache"}}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.data.cache_path(), PathBuf::from("/tmp/screener-cache"));
    }

    #[test]
    fn test_load_from_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("Failed to parse config"));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("SCREENER_LOG_LEVEL", "warn"),
            ("SCREENER_DEFAULT_SCOPE", "zz500"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.observability.log_level, "warn");
        assert_eq!(config.screener.default_scope, "zz500");
        assert_eq!(config.observability.log_format, "pretty");
    }

    #[test]
    fn test_expand_home_leaves_absolute_paths() {
        assert_eq!(expand_home("/var/cache"), PathBuf::from("/var/cache"));
    }
}
