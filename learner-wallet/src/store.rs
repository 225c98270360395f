//! Session persistence.
//!
//! A session is stored as one JSON document under a single key, with the
//! signed-in account's fields at the top level and the ledger state nested
//! beneath them. The store itself only deals in strings.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

#[cfg(feature = "typescript")]
use ts_rs::TS;

use reward_ledger::{Account, LedgerSnapshot};

/// Key the active session is stored under.
pub const SESSION_KEY: &str = "learner_choice_user";

/// Session store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Keys become file names, so they are restricted
    #[error("Invalid store key: {0}")]
    InvalidKey(String),
}

/// Persisted session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    /// Signed-in account, as last seen
    #[serde(flatten)]
    pub user: Account,
    /// Every account the session knows, with the transaction log
    pub ledger: LedgerSnapshot,
    pub saved_at: DateTime<Utc>,
}

impl SessionSnapshot {
    pub fn to_json(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Key-value storage for serialized sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Read the value under `key`, if any.
    async fn load(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replace the value under `key`.
    async fn save(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete `key`. Returns whether anything was removed.
    async fn remove(&self, key: &str) -> Result<bool, StoreError>;
}

/// Load and parse a session snapshot.
pub async fn load_snapshot(store: &dyn SessionStore, key: &str) -> Result<Option<SessionSnapshot>, StoreError> {
    match store.load(key).await? {
        Some(json) => Ok(Some(SessionSnapshot::from_json(&json)?)),
        None => Ok(None),
    }
}

/// Serialize and store a session snapshot.
pub async fn save_snapshot(store: &dyn SessionStore, key: &str, snapshot: &SessionSnapshot) -> Result<(), StoreError> {
    let json = snapshot.to_json()?;
    store.save(key, &json).await
}

fn validate_key(key: &str) -> Result<(), StoreError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        // Readers never observe a partial write
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;

        tracing::debug!(path = %path.display(), bytes = value.len(), "Session saved");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool, StoreError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "Session removed");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store, for tests and ephemeral sessions.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.entries.write().await.remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use reward_ledger::{Balances, Cents, PayoutMethod};

    fn snapshot() -> SessionSnapshot {
        let user = Account::new("u1", "Alex Johnson", NaiveDate::from_ymd_opt(2023, 10, 15).unwrap())
            .with_balances(Balances::new(Cents::new(125000), 450, 500))
            .with_linked(PayoutMethod::Bank);
        SessionSnapshot {
            user,
            ledger: LedgerSnapshot::default(),
            saved_at: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_account_fields_at_top_level() {
        let json: serde_json::Value = serde_json::from_str(&snapshot().to_json().unwrap()).unwrap();
        assert_eq!(json["id"], "u1");
        assert_eq!(json["cashBalance"], 125000);
        assert_eq!(json["stakedPoints"], 500);
        assert!(json["ledger"]["accounts"].is_array());
        assert!(json["savedAt"].is_string());
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemorySessionStore::new();
        assert!(load_snapshot(&store, SESSION_KEY).await.unwrap().is_none());

        save_snapshot(&store, SESSION_KEY, &snapshot()).await.unwrap();
        assert_eq!(store.len().await, 1);
        let loaded = load_snapshot(&store, SESSION_KEY).await.unwrap().unwrap();
        assert_eq!(loaded, snapshot());

        assert!(store.remove(SESSION_KEY).await.unwrap());
        assert!(!store.remove(SESSION_KEY).await.unwrap());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("sessions"));

        assert!(store.load(SESSION_KEY).await.unwrap().is_none());
        save_snapshot(&store, SESSION_KEY, &snapshot()).await.unwrap();
        assert!(dir.path().join("sessions").join("learner_choice_user.json").exists());

        let loaded = load_snapshot(&store, SESSION_KEY).await.unwrap().unwrap();
        assert_eq!(loaded.user.id(), "u1");

        assert!(store.remove(SESSION_KEY).await.unwrap());
        assert!(store.load(SESSION_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());
        assert!(matches!(
            store.save("../escape", "{}").await,
            Err(StoreError::InvalidKey(_))
        ));
    }
}
