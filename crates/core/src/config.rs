//! Configuration management
//!
//! Handles loading and saving the mediaup configuration file. The file lives
//! at `$MU_CONFIG_DIR/config.toml`, or `<config dir>/mediaup/config.toml`
//! when the environment variable is not set.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Current configuration schema version
pub const SCHEMA_VERSION: u32 = 1;

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "MU_CONFIG_DIR";

/// Longest video accepted for upload, in milliseconds
pub const DEFAULT_MAX_VIDEO_DURATION_MS: u64 = 63_000;

/// Largest probe+transmit budget per resumable sub-upload
pub const MAX_RETRY_ATTEMPTS: u32 = 5;

/// Retry settings for the resumable upload path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total probe+transmit cycles per sub-upload
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff before the second attempt
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Upper bound on any single backoff
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_max_attempts() -> u32 {
    MAX_RETRY_ATTEMPTS
}

fn default_initial_backoff_ms() -> u64 {
    200
}

fn default_max_backoff_ms() -> u64 {
    5000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// mediaup configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Schema version for forward compatibility
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Base URL that named API resources are resolved against
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Host serving the resumable `rupload_ig*` endpoints
    #[serde(default = "default_rupload_host")]
    pub rupload_host: String,

    /// Host header sent with legacy chunk uploads
    #[serde(default = "default_legacy_upload_host")]
    pub legacy_upload_host: String,

    /// User-Agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Longest accepted video, in milliseconds
    #[serde(default = "default_max_video_duration_ms")]
    pub max_video_duration_ms: u64,

    /// Session cookie value; `MU_SESSION_ID` takes precedence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// Retry policy for resumable uploads
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

fn default_api_base() -> String {
    "https://i.instagram.com/api/v1".to_string()
}

fn default_rupload_host() -> String {
    "i.instagram.com".to_string()
}

fn default_legacy_upload_host() -> String {
    "upload.instagram.com".to_string()
}

fn default_user_agent() -> String {
    format!("mediaup/{}", env!("CARGO_PKG_VERSION"))
}

fn default_max_video_duration_ms() -> u64 {
    DEFAULT_MAX_VIDEO_DURATION_MS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            api_base: default_api_base(),
            rupload_host: default_rupload_host(),
            legacy_upload_host: default_legacy_upload_host(),
            user_agent: default_user_agent(),
            max_video_duration_ms: DEFAULT_MAX_VIDEO_DURATION_MS,
            session_id: None,
            retry: RetryConfig::default(),
        }
    }
}

/// Loads and persists [`Config`]
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a manager pointing at the default configuration location
    pub fn new() -> Result<Self> {
        let dir = match std::env::var_os(CONFIG_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::config_dir()
                .ok_or_else(|| Error::Config("Cannot determine config directory".into()))?
                .join("mediaup"),
        };
        Ok(Self::with_path(dir.join("config.toml")))
    }

    /// Create a manager for an explicit file path
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
        }
    }

    /// Path of the configuration file
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load the configuration, returning defaults when the file is absent
    pub fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            tracing::debug!(path = %self.config_path.display(), "No config file, using defaults");
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&self.config_path)?;
        let config: Config = toml::from_str(&content)?;

        if config.schema_version > SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "Config schema version {} is newer than supported version {}",
                config.schema_version, SCHEMA_VERSION
            )));
        }
        if !(1..=MAX_RETRY_ATTEMPTS).contains(&config.retry.max_attempts) {
            return Err(Error::Config(format!(
                "retry.max_attempts must be between 1 and {MAX_RETRY_ATTEMPTS}, got {}",
                config.retry.max_attempts
            )));
        }

        Ok(config)
    }

    /// Write the configuration, creating parent directories as needed
    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(config)?;
        std::fs::write(&self.config_path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_returns_defaults() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("config.toml"));
        let config = manager.load().unwrap();
        assert_eq!(config.max_video_duration_ms, 63_000);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.rupload_host, "i.instagram.com");
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("nested").join("config.toml"));

        let config = Config {
            rupload_host: "upload.example.com".to_string(),
            session_id: Some("abc".to_string()),
            ..Default::default()
        };
        manager.save(&config).unwrap();

        let loaded = manager.load().unwrap();
        assert_eq!(loaded.rupload_host, "upload.example.com");
        assert_eq!(loaded.session_id.as_deref(), Some("abc"));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[retry]\nmax_attempts = 3\n").unwrap();

        let config = ConfigManager::with_path(&path).load().unwrap();
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.initial_backoff_ms, 200);
        assert_eq!(config.api_base, "https://i.instagram.com/api/v1");
    }

    #[test]
    fn test_rejects_zero_attempts() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[retry]\nmax_attempts = 0\n").unwrap();

        let result = ConfigManager::with_path(&path).load();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_attempts_above_cap() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[retry]\nmax_attempts = 6\n").unwrap();

        let err = ConfigManager::with_path(&path).load().unwrap_err();
        assert!(err.to_string().contains("between 1 and 5"));

        std::fs::write(&path, "[retry]\nmax_attempts = 5\n").unwrap();
        let config = ConfigManager::with_path(&path).load().unwrap();
        assert_eq!(config.retry.max_attempts, MAX_RETRY_ATTEMPTS);
    }

    #[test]
    fn test_rejects_newer_schema() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "schema_version = 99\n").unwrap();

        let result = ConfigManager::with_path(&path).load();
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
