/// CLI configuration
use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File read when no `--config` path is given
pub const DEFAULT_CONFIG_FILE: &str = "ledger.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LedgerConfig {
    #[serde(default = "default_storage")]
    pub storage: StorageSettings,

    #[serde(default)]
    pub remote: RemoteSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    #[serde(default = "default_database_url")]
    pub database_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteSettings {
    /// Sync server base URL; local-only when unset
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl RemoteSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Configured URL, treating a blank value as unset
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }
}

impl LedgerConfig {
    /// Load configuration from `ledger.toml` (if present) and the environment
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration from `path`, or `ledger.toml` when `None`
    ///
    /// Environment variables prefixed with `LEDGER_` override the file, with
    /// `__` separating sections (e.g. `LEDGER_REMOTE__URL`).
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        let config_path =
            path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), Path::to_path_buf);
        if config_path.exists() {
            settings = settings.add_source(config::File::from(config_path));
        } else if path.is_some() {
            return Err(CliError::Config(format!(
                "config file not found: {}",
                config_path.display()
            )));
        }

        settings = settings.add_source(
            config::Environment::with_prefix("LEDGER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| CliError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.storage.database_url.trim().is_empty() {
            return Err(CliError::Config(
                "database URL is required (set LEDGER_STORAGE__DATABASE_URL)".to_string(),
            ));
        }

        if !self.storage.database_url.starts_with("sqlite:") {
            return Err(CliError::Config(format!(
                "unsupported database URL {:?}, expected sqlite://",
                self.storage.database_url
            )));
        }

        if let Some(url) = self.remote.url() {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(CliError::Config(format!(
                    "remote URL must start with http:// or https://, got {url:?}"
                )));
            }
        }

        if self.remote.timeout_secs == 0 {
            return Err(CliError::Config(
                "remote timeout must be at least one second".to_string(),
            ));
        }

        Ok(())
    }
}

// Default values
fn default_storage() -> StorageSettings {
    StorageSettings {
        database_url: default_database_url(),
    }
}

fn default_database_url() -> String {
    "sqlite://./data/ledger.db".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            storage: default_storage(),
            remote: RemoteSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = LedgerConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.remote.url().is_none());
        assert_eq!(config.remote.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_blank_remote_url_is_unset() {
        let mut config = LedgerConfig::default();
        config.remote.url = Some("   ".into());
        assert!(config.remote.url().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = LedgerConfig::default();
        config.storage.database_url = "postgres://db".into();
        assert!(config.validate().is_err());

        let mut config = LedgerConfig::default();
        config.remote.url = Some("ledger.example.com".into());
        assert!(config.validate().is_err());

        let mut config = LedgerConfig::default();
        config.remote.timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
