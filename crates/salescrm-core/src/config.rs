//! Application configuration management.
//!
//! Stored at `~/.config/salescrm/config.json`. Environment variables
//! (optionally from a `.env` file loaded by the binary) override the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::auth::{FileTokenStore, KeyringTokenStore, TokenStore};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "salescrm";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8001";

pub const ENV_BACKEND_URL: &str = "SALESCRM_BACKEND_URL";
pub const ENV_USERNAME: &str = "SALESCRM_USERNAME";
pub const ENV_PASSWORD: &str = "SALESCRM_PASSWORD";

/// Where the session token is persisted between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStorage {
    #[default]
    File,
    Keyring,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub backend_url: Option<String>,
    #[serde(default)]
    pub last_username: Option<String>,
    #[serde(default)]
    pub token_storage: TokenStorage,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path).context("Failed to read config file")?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents).context("Failed to write config file")?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Backend base URL: environment, then config file, then the default.
    pub fn backend_url(&self) -> String {
        resolve_backend_url(std::env::var(ENV_BACKEND_URL).ok(), self.backend_url.as_deref())
    }

    /// Username to prefill on the login form.
    pub fn default_username(&self) -> Option<String> {
        non_empty_env(ENV_USERNAME).or_else(|| self.last_username.clone())
    }

    /// Token store selected by `token_storage`.
    pub fn token_store(&self) -> Result<Box<dyn TokenStore>> {
        Ok(match self.token_storage {
            TokenStorage::File => Box::new(FileTokenStore::new(self.cache_dir()?)),
            TokenStorage::Keyring => Box::new(KeyringTokenStore),
        })
    }
}

/// Password supplied through the environment, for non-interactive login.
pub fn env_password() -> Option<String> {
    non_empty_env(ENV_PASSWORD)
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn resolve_backend_url(env: Option<String>, configured: Option<&str>) -> String {
    env.filter(|v| !v.trim().is_empty())
        .or_else(|| configured.filter(|v| !v.trim().is_empty()).map(str::to_string))
        .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_url_precedence() {
        assert_eq!(resolve_backend_url(None, None), DEFAULT_BACKEND_URL);
        assert_eq!(
            resolve_backend_url(None, Some("https://crm.example.com")),
            "https://crm.example.com"
        );
        assert_eq!(
            resolve_backend_url(Some("http://10.0.0.5:8001".into()), Some("https://crm.example.com")),
            "http://10.0.0.5:8001"
        );
        assert_eq!(resolve_backend_url(Some(" ".into()), None), DEFAULT_BACKEND_URL);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("salescrm").join(CONFIG_FILE);

        let config = Config {
            backend_url: Some("https://crm.example.com".into()),
            last_username: Some("agent1".into()),
            token_storage: TokenStorage::Keyring,
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.backend_url.as_deref(), Some("https://crm.example.com"));
        assert_eq!(loaded.last_username.as_deref(), Some("agent1"));
        assert_eq!(loaded.token_storage, TokenStorage::Keyring);
    }

    #[test]
    fn test_missing_file_and_fields_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_from(&dir.path().join("absent.json")).unwrap();
        assert!(loaded.backend_url.is_none());
        assert_eq!(loaded.token_storage, TokenStorage::File);

        let partial: Config = serde_json::from_str(r#"{"last_username":"admin1"}"#).unwrap();
        assert_eq!(partial.token_storage, TokenStorage::File);
        assert_eq!(partial.last_username.as_deref(), Some("admin1"));
    }
}
