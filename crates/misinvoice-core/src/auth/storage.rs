//! Persisted client storage for the bearer credential.
//!
//! One key, one value. Absence of the key means "logged out".

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use keyring::Entry;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Storage key (file stem, keychain account name).
pub const CREDENTIAL_KEY: &str = "credential";

/// Keychain service name
const SERVICE_NAME: &str = "misinvoice";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stored credential is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Keychain error: {0}")]
    Keyring(#[from] keyring::Error),
}

/// What is written under [`CREDENTIAL_KEY`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredential {
    pub token: String,
    pub stored_at: DateTime<Utc>,
}

impl StoredCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            stored_at: Utc::now(),
        }
    }
}

pub trait CredentialStorage: Send + Sync {
    fn load(&self) -> Result<Option<StoredCredential>, StorageError>;
    fn store(&self, credential: &StoredCredential) -> Result<(), StorageError>;
    /// Remove the key. Removing a missing key is not an error.
    fn remove(&self) -> Result<(), StorageError>;
}

/// JSON file in the cache directory.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", CREDENTIAL_KEY))
    }
}

impl CredentialStorage for FileStorage {
    fn load(&self) -> Result<Option<StoredCredential>, StorageError> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    fn store(&self, credential: &StoredCredential) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir)?;
        let contents = serde_json::to_string_pretty(credential)?;
        std::fs::write(self.path(), contents)?;
        Ok(())
    }

    fn remove(&self) -> Result<(), StorageError> {
        let path = self.path();
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// OS keychain entry.
pub struct KeyringStorage {
    entry: Entry,
}

impl KeyringStorage {
    pub fn new() -> Result<Self, StorageError> {
        Ok(Self {
            entry: Entry::new(SERVICE_NAME, CREDENTIAL_KEY)?,
        })
    }
}

impl CredentialStorage for KeyringStorage {
    fn load(&self) -> Result<Option<StoredCredential>, StorageError> {
        match self.entry.get_password() {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn store(&self, credential: &StoredCredential) -> Result<(), StorageError> {
        let raw = serde_json::to_string(credential)?;
        self.entry.set_password(&raw)?;
        Ok(())
    }

    fn remove(&self) -> Result<(), StorageError> {
        match self.entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Process-local storage. Clones share the same slot, so a test can keep
/// a handle and inspect what the session store wrote.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    slot: Arc<Mutex<Option<StoredCredential>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains_key(&self) -> bool {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).is_some()
    }
}

impl CredentialStorage for MemoryStorage {
    fn load(&self) -> Result<Option<StoredCredential>, StorageError> {
        Ok(self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn store(&self, credential: &StoredCredential) -> Result<(), StorageError> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(credential.clone());
        Ok(())
    }

    fn remove(&self) -> Result<(), StorageError> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested"));

        assert!(storage.load().unwrap().is_none());

        let stored = StoredCredential::new("tok");
        storage.store(&stored).unwrap();
        assert!(storage.path().exists());
        assert_eq!(storage.load().unwrap(), Some(stored));

        storage.remove().unwrap();
        assert!(!storage.path().exists());
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn test_file_storage_remove_missing_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf());
        assert!(storage.remove().is_ok());
    }

    #[test]
    fn test_file_storage_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf());
        std::fs::write(storage.path(), "{ not json").unwrap();
        assert!(matches!(storage.load(), Err(StorageError::Corrupt(_))));
    }

    #[test]
    fn test_memory_storage_clones_share_slot() {
        let storage = MemoryStorage::new();
        let handle = storage.clone();
        storage.store(&StoredCredential::new("tok")).unwrap();
        assert!(handle.contains_key());
        handle.remove().unwrap();
        assert!(!storage.contains_key());
    }
}
