//! Durable persistence of the bearer token and its expiry.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Session store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Session record could not be serialised: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Session record is corrupt: {0}")]
    Corrupt(String),
}

/// The two persisted scalars: token and absolute expiry in epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSession {
    #[serde(rename = "auth_token")]
    pub token: String,
    #[serde(rename = "auth_token_expiry")]
    pub expires_at_ms: i64,
}

pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<PersistedSession>, StoreError>;
    fn save(&self, session: &PersistedSession) -> Result<(), StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
}

/// JSON file on disk.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut staging = self.path.clone().into_os_string();
        staging.push(".tmp");
        PathBuf::from(staging)
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<PersistedSession>, StoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<PersistedSession>(&raw) {
            Ok(session) if !session.token.is_empty() => Ok(Some(session)),
            Ok(_) => {
                tracing::warn!(path = %self.path.display(), "Persisted session has an empty token, clearing");
                self.clear()?;
                Ok(None)
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Persisted session is unreadable, clearing");
                self.clear()?;
                Ok(None)
            }
        }
    }

    fn save(&self, session: &PersistedSession) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let staging = self.staging_path();
        std::fs::write(&staging, serde_json::to_vec(session)?)?;
        std::fs::rename(&staging, &self.path)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    record: Mutex<Option<PersistedSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: PersistedSession) -> Self {
        Self {
            record: Mutex::new(Some(session)),
        }
    }

    /// Snapshot of what is currently persisted.
    pub fn snapshot(&self) -> Option<PersistedSession> {
        self.record.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<PersistedSession>, StoreError> {
        Ok(self.snapshot())
    }

    fn save(&self, session: &PersistedSession) -> Result<(), StoreError> {
        *self.record.lock().unwrap_or_else(|e| e.into_inner()) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.record.lock().unwrap_or_else(|e| e.into_inner()).take();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PersistedSession {
        PersistedSession {
            token: "tok-1".to_string(),
            expires_at_ms: 1_700_000_360_000,
        }
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        FileSessionStore::new(&path).save(&sample()).unwrap();
        let loaded = FileSessionStore::new(&path).load().unwrap();

        assert_eq!(loaded, Some(sample()));
    }

    #[test]
    fn test_file_store_uses_documented_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        FileSessionStore::new(&path).save(&sample()).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["auth_token"], "tok-1");
        assert_eq!(raw["auth_token_expiry"], 1_700_000_360_000i64);
    }

    #[test]
    fn test_file_store_missing_file_is_no_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("absent.json"));
        assert_eq!(store.load().unwrap(), None);
        store.clear().unwrap();
    }

    #[test]
    fn test_file_store_corrupt_file_is_cleared() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{\"auth_token\":").unwrap();

        let store = FileSessionStore::new(&path);
        assert_eq!(store.load().unwrap(), None);
        assert!(!path.exists());
    }

    #[test]
    fn test_memory_store_clear() {
        let store = MemorySessionStore::with_session(sample());
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }
}
