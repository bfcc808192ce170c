//! Configuration loading and client settings resolution
//!
//! Settings resolve in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing config file is never fatal: it is logged and the remaining
//! tiers are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Environment variable overriding the backend base URL
pub const API_BASE_URL_ENV: &str = "ALEX_API_BASE_URL";
/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "ALEX_CONFIG";

/// Compiled defaults used when no other tier supplies a value
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub poll_interval: Duration,
    pub navigation_delay: Duration,
    pub list_stale_time: Duration,
    pub log_level: String,
}

impl Default for CompiledDefaults {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000".to_string(),
            request_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(2500),
            navigation_delay: Duration::from_millis(500),
            list_stale_time: Duration::from_secs(30),
            log_level: "info".to_string(),
        }
    }
}

/// `[logging]` table of the TOML config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// On-disk configuration (`config.toml`)
///
/// Every key is optional so partial files stay valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_interval_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navigation_delay_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_stale_secs: Option<u64>,
    pub logging: LoggingConfig,
}

/// Fully resolved client settings
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    /// Backend base URL without trailing slash
    pub api_base_url: String,
    pub request_timeout: Duration,
    /// Delay between job status polls
    pub poll_interval: Duration,
    /// Delay between a completed job and the navigation request
    pub navigation_delay: Duration,
    /// Staleness window of the meetings list query
    pub list_stale_time: Duration,
    pub log_level: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        let defaults = CompiledDefaults::default();
        Self {
            api_base_url: defaults.api_base_url,
            request_timeout: defaults.request_timeout,
            poll_interval: defaults.poll_interval,
            navigation_delay: defaults.navigation_delay,
            list_stale_time: defaults.list_stale_time,
            log_level: defaults.log_level,
        }
    }
}

/// Resolves [`ClientSettings`] from CLI, environment, TOML and defaults
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    cli_api_base_url: Option<String>,
    cli_config_path: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Base URL given on the command line
    pub fn with_api_base_url(mut self, url: Option<String>) -> Self {
        self.cli_api_base_url = url;
        self
    }

    /// Config file given on the command line
    pub fn with_config_path(mut self, path: Option<PathBuf>) -> Self {
        self.cli_config_path = path;
        self
    }

    /// Config file location: CLI → `ALEX_CONFIG` → `<config_dir>/alex/config.toml`
    pub fn config_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.cli_config_path {
            return Some(path.clone());
        }
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }
        default_config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Resolve settings
    ///
    /// Fails only when a config file exists but cannot be parsed, or when the
    /// winning base URL is not an http(s) URL.
    pub fn resolve(&self) -> Result<ClientSettings> {
        let toml_config = match self.config_path() {
            Some(path) if path.exists() => load_toml_config(&path)?,
            Some(path) => {
                warn!(path = %path.display(), "Config file not found, using defaults");
                TomlConfig::default()
            }
            None => {
                warn!("Could not determine config directory, using defaults");
                TomlConfig::default()
            }
        };

        let defaults = CompiledDefaults::default();

        let env_url = std::env::var(API_BASE_URL_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty());

        let (api_base_url, source) = if let Some(url) = &self.cli_api_base_url {
            (url.clone(), "command line")
        } else if let Some(url) = env_url {
            (url, "environment")
        } else if let Some(url) = &toml_config.api_base_url {
            (url.clone(), "TOML")
        } else {
            (defaults.api_base_url.clone(), "default")
        };
        debug!(api_base_url = %api_base_url, source, "Resolved API base URL");

        let api_base_url = normalize_base_url(&api_base_url)?;

        Ok(ClientSettings {
            api_base_url,
            request_timeout: toml_config
                .request_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            poll_interval: toml_config
                .poll_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll_interval),
            navigation_delay: toml_config
                .navigation_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.navigation_delay),
            list_stale_time: toml_config
                .list_stale_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.list_stale_time),
            log_level: toml_config.logging.level,
        })
    }
}

/// Trim whitespace and trailing slashes; require an http(s) scheme
pub fn normalize_base_url(url: &str) -> Result<String> {
    let trimmed = url.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(Error::Config(format!(
            "API base URL must start with http:// or https://: {:?}",
            url
        )));
    }
    Ok(trimmed.to_string())
}

/// Per-user config directory (`~/.config/alex` on Linux)
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("alex"))
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))
}

/// Write a TOML config file atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;
    write_atomic(path, content.as_bytes())
}

/// Write bytes to `path` via a sibling temp file and rename
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let tmp_path = path.with_extension("tmp");
    std::fs::write(&tmp_path, bytes)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url("http://localhost:5000/").unwrap(),
            "http://localhost:5000"
        );
        assert_eq!(
            normalize_base_url("  https://api.example.com//  ").unwrap(),
            "https://api.example.com"
        );
        assert!(normalize_base_url("localhost:5000").is_err());
    }

    #[test]
    fn test_partial_toml_is_valid() {
        let config: TomlConfig = toml::from_str("poll_interval_ms = 1000").unwrap();
        assert_eq!(config.poll_interval_ms, Some(1000));
        assert!(config.api_base_url.is_none());
        assert_eq!(config.logging.level, "info");
    }
}
