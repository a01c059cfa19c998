use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;

use crate::repository::{RecoveryStore, StorageError};
use proctor_core::model::{RecoveryKey, TabScope};

use super::SqliteRepository;

impl SqliteRepository {
    /// Delete entries left behind by other scopes.
    ///
    /// Called when a fresh window starts so stale recovery state from an
    /// earlier window cannot leak into this one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the delete fails.
    pub async fn discard_other_scopes(&self) -> Result<u64, StorageError> {
        let result = sqlx::query("DELETE FROM recovery_entries WHERE scope <> ?1")
            .bind(self.scope.to_string())
            .execute(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl RecoveryStore for SqliteRepository {
    fn scope(&self) -> TabScope {
        self.scope
    }

    async fn put(&self, key: RecoveryKey, value: &str) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO recovery_entries (scope, key, value, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(scope, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            ",
        )
        .bind(self.scope.to_string())
        .bind(key.as_str())
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }

    async fn get(&self, key: RecoveryKey) -> Result<Option<String>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT value
            FROM recovery_entries
            WHERE scope = ?1 AND key = ?2
            ",
        )
        .bind(self.scope.to_string())
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let value: String = row
            .try_get("value")
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        Ok(Some(value))
    }

    async fn clear(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM recovery_entries WHERE scope = ?1")
            .bind(self.scope.to_string())
            .execute(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;
        Ok(())
    }
}
