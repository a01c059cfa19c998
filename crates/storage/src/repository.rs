use async_trait::async_trait;
use proctor_core::model::{RecoveryKey, RecoveryRecord, RecoveryRecordError, TabScope};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<RecoveryRecordError> for StorageError {
    fn from(err: RecoveryRecordError) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Tab-scoped key/value store behind the recovery record.
///
/// Every adapter is bound to one `TabScope`; entries written under one scope
/// are never visible from another.
#[async_trait]
pub trait RecoveryStore: Send + Sync {
    /// The scope this store reads and writes.
    fn scope(&self) -> TabScope;

    /// Write one entry, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the entry cannot be stored.
    async fn put(&self, key: RecoveryKey, value: &str) -> Result<(), StorageError>;

    /// Read one entry.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for backend failures. A missing key is `Ok(None)`.
    async fn get(&self, key: RecoveryKey) -> Result<Option<String>, StorageError>;

    /// Remove every entry of this scope.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the entries cannot be removed.
    async fn clear(&self) -> Result<(), StorageError>;
}

/// Reads all keys and assembles the typed record.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if stored values are malformed.
pub async fn load_record(store: &dyn RecoveryStore) -> Result<Option<RecoveryRecord>, StorageError> {
    let session_id = store.get(RecoveryKey::SessionId).await?;
    let config = store.get(RecoveryKey::Config).await?;
    let remaining = store.get(RecoveryKey::TotalTimeRemaining).await?;
    Ok(RecoveryRecord::decode(
        session_id.as_deref(),
        config.as_deref(),
        remaining.as_deref(),
    )?)
}

/// Writes every present field of `record`.
///
/// # Errors
///
/// Returns `StorageError` if any entry cannot be stored.
pub async fn save_record(
    store: &dyn RecoveryStore,
    record: &RecoveryRecord,
) -> Result<(), StorageError> {
    for key in RecoveryKey::ALL {
        if let Some(value) = record.encode(key)? {
            store.put(key, &value).await?;
        }
    }
    Ok(())
}

/// Simple in-memory store for testing and single-window use.
///
/// Clones share the same backing map, so a second handle on the same scope
/// sees what the first wrote, the way a reloaded page sees its tab's storage.
#[derive(Clone)]
pub struct InMemoryRecoveryStore {
    scope: TabScope,
    entries: Arc<Mutex<HashMap<(TabScope, RecoveryKey), String>>>,
}

impl InMemoryRecoveryStore {
    #[must_use]
    pub fn new(scope: TabScope) -> Self {
        Self {
            scope,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Another handle over the same backing map, bound to a different scope.
    #[must_use]
    pub fn with_scope(&self, scope: TabScope) -> Self {
        Self {
            scope,
            entries: Arc::clone(&self.entries),
        }
    }
}

#[async_trait]
impl RecoveryStore for InMemoryRecoveryStore {
    fn scope(&self) -> TabScope {
        self.scope
    }

    async fn put(&self, key: RecoveryKey, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert((self.scope, key), value.to_string());
        Ok(())
    }

    async fn get(&self, key: RecoveryKey) -> Result<Option<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&(self.scope, key)).cloned())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.retain(|(scope, _), _| *scope != self.scope);
        Ok(())
    }
}
