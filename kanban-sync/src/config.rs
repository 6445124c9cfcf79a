//! Configuration loaded with figment
//!
//! Sources, later overriding earlier:
//! 1. Built-in defaults
//! 2. `kanban-sync.toml`, `kanban-sync.yaml`, `kanban-sync.json` in the
//!    directory passed to [`SyncConfig::load_from`]
//! 3. `KANBAN_SYNC_*` environment variables, `__` separating nested keys
//!    (`KANBAN_SYNC_RETRY__MAX_RETRIES=5`)

use crate::error::{Result, SyncError};
use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, trace};

/// File stem searched for in the config directory
pub const CONFIG_FILE_STEM: &str = "kanban-sync";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "KANBAN_SYNC_";

/// Freshness window for fetched lists
pub const DEFAULT_STALE_AFTER_SECS: u64 = 60;

/// Backoff policy for remote reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 1000,
            max_delay_ms: 8000,
        }
    }
}

impl RetryConfig {
    /// No retries at all
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (0-based): `min(base * 2^attempt, max)`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let delay = self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms);
        Duration::from_millis(delay)
    }
}

/// Runtime configuration for a [`SyncContext`](crate::SyncContext)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Remote API root; `None` runs in local-only mode
    pub api_base_url: Option<String>,
    /// Directory for the file-backed mirror; `None` keeps it in memory
    pub storage_dir: Option<PathBuf>,
    /// Prepended to every mirror key
    pub mirror_prefix: String,
    pub retry: RetryConfig,
    pub request_timeout_secs: u64,
    /// How long a fetched list is served from the cache before the next
    /// read goes back to the remote; 0 always refetches
    pub stale_after_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_base_url: None,
            storage_dir: None,
            mirror_prefix: String::new(),
            retry: RetryConfig::default(),
            request_timeout_secs: 30,
            stale_after_secs: DEFAULT_STALE_AFTER_SECS,
        }
    }
}

impl SyncConfig {
    /// Defaults overlaid with environment variables only
    pub fn load() -> Result<Self> {
        Self::extract(Self::base_figment().merge(Self::env_provider()))
    }

    /// Defaults, then config files in `dir`, then environment variables
    pub fn load_from(dir: &Path) -> Result<Self> {
        let mut figment = Self::base_figment();
        for (file_name, format) in Self::candidate_files() {
            let path = dir.join(&file_name);
            if !path.is_file() {
                continue;
            }
            trace!(path = %path.display(), "loading config file");
            figment = match format {
                ConfigFormat::Toml => figment.merge(Toml::file(&path)),
                ConfigFormat::Yaml => figment.merge(Yaml::file(&path)),
                ConfigFormat::Json => figment.merge(Json::file(&path)),
            };
        }
        Self::extract(figment.merge(Self::env_provider()))
    }

    /// Build from an explicit figment; used by embedders with their own sources
    pub fn extract(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract()?;
        config.validate()?;
        debug!(
            remote = config.api_base_url.as_deref().unwrap_or("<local-only>"),
            storage = ?config.storage_dir,
            "loaded sync config"
        );
        Ok(config)
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }

    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn with_stale_after_secs(mut self, secs: u64) -> Self {
        self.stale_after_secs = secs;
        self
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }

    /// Reject settings that cannot work
    pub fn validate(&self) -> Result<()> {
        if let Some(url) = &self.api_base_url {
            url::Url::parse(url)
                .map_err(|e| SyncError::validation("api_base_url", e.to_string()))?;
        }
        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(SyncError::validation(
                "retry.base_delay_ms",
                "must not exceed retry.max_delay_ms",
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(SyncError::validation(
                "request_timeout_secs",
                "must be greater than zero",
            ));
        }
        Ok(())
    }

    fn base_figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
    }

    fn env_provider() -> Env {
        Env::prefixed(ENV_PREFIX).split("__")
    }

    fn candidate_files() -> Vec<(String, ConfigFormat)> {
        vec![
            (format!("{}.toml", CONFIG_FILE_STEM), ConfigFormat::Toml),
            (format!("{}.yaml", CONFIG_FILE_STEM), ConfigFormat::Yaml),
            (format!("{}.json", CONFIG_FILE_STEM), ConfigFormat::Json),
        ]
    }
}

#[derive(Debug, Clone, Copy)]
enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn clear_env() {
        for (key, _) in std::env::vars() {
            if key.starts_with(ENV_PREFIX) {
                std::env::remove_var(key);
            }
        }
    }

    #[test]
    fn test_retry_delay_is_capped() {
        let retry = RetryConfig::default();
        assert_eq!(retry.delay_for(0), Duration::from_millis(1000));
        assert_eq!(retry.delay_for(1), Duration::from_millis(2000));
        assert_eq!(retry.delay_for(3), Duration::from_millis(8000));
        assert_eq!(retry.delay_for(70), Duration::from_millis(8000));
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let temp = TempDir::new().unwrap();
        let config = SyncConfig::load_from(temp.path()).unwrap();
        assert_eq!(config, SyncConfig::default());
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.stale_after(), Duration::from_secs(60));
        assert!(config.api_base_url.is_none());
    }

    #[test]
    #[serial]
    fn test_file_then_env_precedence() {
        clear_env();
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("kanban-sync.toml"),
            r#"
api_base_url = "http://localhost:3000"
mirror_prefix = "kanban:"

[retry]
max_retries = 4
"#,
        )
        .unwrap();
        fs::write(
            temp.path().join("kanban-sync.yaml"),
            "request_timeout_secs: 10\nstale_after_secs: 5\n",
        )
        .unwrap();

        std::env::set_var("KANBAN_SYNC_RETRY__MAX_RETRIES", "1");
        let config = SyncConfig::load_from(temp.path());
        clear_env();
        let config = config.unwrap();

        assert_eq!(config.api_base_url.as_deref(), Some("http://localhost:3000"));
        assert_eq!(config.mirror_prefix, "kanban:");
        assert_eq!(config.request_timeout_secs, 10);
        assert_eq!(config.stale_after_secs, 5);
        assert_eq!(config.retry.max_retries, 1);
        assert_eq!(config.retry.base_delay_ms, 1000);
    }

    #[test]
    #[serial]
    fn test_invalid_values_rejected() {
        clear_env();
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("kanban-sync.json"),
            r#"{"retry": {"base_delay_ms": 9000}}"#,
        )
        .unwrap();
        let err = SyncConfig::load_from(temp.path()).unwrap_err();
        assert!(err.is_validation());

        fs::write(
            temp.path().join("kanban-sync.json"),
            r#"{"api_base_url": "not a url"}"#,
        )
        .unwrap();
        assert!(SyncConfig::load_from(temp.path()).is_err());
    }

    #[test]
    #[serial]
    fn test_malformed_file_is_config_error() {
        clear_env();
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("kanban-sync.toml"), "retry = [").unwrap();
        assert!(matches!(
            SyncConfig::load_from(temp.path()),
            Err(SyncError::Config(_))
        ));
    }
}
