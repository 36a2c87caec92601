//! Application configuration management.
//!
//! Stores the backend URL, the last e-mail used to sign in, and where the
//! credential is persisted. Lives at `~/.config/misinvoice/config.json`;
//! `MISINVOICE_API_URL` and `MISINVOICE_EMAIL` override the file, even when
//! the file itself is unreadable.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api::client::DEFAULT_BASE_URL;
use crate::auth::{CredentialStorage, FileStorage, KeyringStorage, MemoryStorage};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "misinvoice";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const ENV_API_URL: &str = "MISINVOICE_API_URL";
pub const ENV_EMAIL: &str = "MISINVOICE_EMAIL";
pub const ENV_PASSWORD: &str = "MISINVOICE_PASSWORD";

/// Where the session credential is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialBackend {
    /// `credential.json` in the cache directory
    #[default]
    File,
    /// OS keychain
    Keyring,
    /// Process memory only, gone on exit (`--ephemeral`)
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub last_email: Option<String>,
    pub credential_backend: CredentialBackend,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_BASE_URL.to_string(),
            last_email: None,
            credential_backend: CredentialBackend::default(),
        }
    }
}

impl Config {
    /// Load from the default location, falling back to defaults when the
    /// file is missing or unreadable, then apply environment overrides.
    pub fn load() -> Self {
        Self::load_with(Self::path(), |key| std::env::var(key).ok())
    }

    fn load_with<F>(path: Result<PathBuf>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path.and_then(|path| Self::load_from(&path)) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Self::default()
            }
        };
        config.apply_env(lookup);
        config
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Invalid config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    /// Write the config as JSON. A memory-backed run leaves nothing on
    /// disk, so it skips the write.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if self.credential_backend == CredentialBackend::Memory {
            debug!("Memory credential backend, config not saved");
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        debug!(path = %path.display(), "Saved config");
        Ok(())
    }

    /// Apply overrides from `lookup` (the process environment outside tests).
    /// Blank values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        if let Some(url) = get(ENV_API_URL) {
            self.api_base_url = url;
        }
        if let Some(email) = get(ENV_EMAIL) {
            self.last_email = Some(email);
        }
    }

    /// Default config file location
    pub fn path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Credential storage for the configured backend.
    pub fn build_storage(&self) -> Result<Box<dyn CredentialStorage>> {
        self.storage_in(|| self.cache_dir())
    }

    fn storage_in<F>(&self, cache_dir: F) -> Result<Box<dyn CredentialStorage>>
    where
        F: FnOnce() -> Result<PathBuf>,
    {
        Ok(match self.credential_backend {
            CredentialBackend::File => Box::new(FileStorage::new(cache_dir()?)),
            CredentialBackend::Keyring => Box::new(
                KeyringStorage::new().context("Failed to open OS keychain")?,
            ),
            CredentialBackend::Memory => Box::new(MemoryStorage::new()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StoredCredential;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.api_base_url, "http://localhost:8080");
        assert_eq!(config.credential_backend, CredentialBackend::File);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            api_base_url: "https://mis.example.test".into(),
            last_email: Some("ops@example.test".into()),
            credential_backend: CredentialBackend::Keyring,
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"keyring\""));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"last_email":"a@b.test"}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.api_base_url, DEFAULT_BASE_URL);
        assert_eq!(config.last_email.as_deref(), Some("a@b.test"));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env(|key| match key {
            ENV_API_URL => Some("http://10.0.0.5:9000".into()),
            ENV_EMAIL => Some("   ".into()),
            _ => None,
        });
        assert_eq!(config.api_base_url, "http://10.0.0.5:9000");
        assert_eq!(config.last_email, None);
    }

    #[test]
    fn test_corrupt_file_still_takes_env_overrides() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();

        let config = Config::load_with(Ok(path), |key| match key {
            ENV_API_URL => Some("http://10.0.0.5:9000".into()),
            ENV_EMAIL => Some("ops@example.test".into()),
            _ => None,
        });
        assert_eq!(config.api_base_url, "http://10.0.0.5:9000");
        assert_eq!(config.last_email.as_deref(), Some("ops@example.test"));
        assert_eq!(config.credential_backend, CredentialBackend::File);
    }

    #[test]
    fn test_memory_backend_leaves_cache_dir_untouched() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            credential_backend: CredentialBackend::Memory,
            ..Config::default()
        };

        let storage = config.storage_in(|| Ok(dir.path().to_path_buf())).unwrap();
        storage.store(&StoredCredential::new("tok")).unwrap();
        assert_eq!(storage.load().unwrap().unwrap().token, "tok");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

        config.save_to(&dir.path().join("config.json")).unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

        // The file backend writes to the same directory.
        let file = Config::default().storage_in(|| Ok(dir.path().to_path_buf())).unwrap();
        file.store(&StoredCredential::new("tok")).unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_memory_backend_name() {
        let config: Config = serde_json::from_str(r#"{"credential_backend":"memory"}"#).unwrap();
        assert_eq!(config.credential_backend, CredentialBackend::Memory);
    }
}
