use std::fmt;

use thiserror::Error;

use crate::model::{SessionConfig, SessionConfigError, SessionId, TestSizing};

/// The fixed key set of the tab-scoped recovery store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecoveryKey {
    SessionId,
    Config,
    TotalTimeRemaining,
}

impl RecoveryKey {
    pub const ALL: [RecoveryKey; 3] = [
        RecoveryKey::SessionId,
        RecoveryKey::Config,
        RecoveryKey::TotalTimeRemaining,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SessionId => "session_id",
            Self::Config => "config",
            Self::TotalTimeRemaining => "total_time_remaining",
        }
    }
}

impl fmt::Display for RecoveryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RecoveryRecordError {
    #[error("recovery entry `{key}` is malformed: {reason}")]
    Malformed { key: RecoveryKey, reason: String },

    #[error(transparent)]
    Config(#[from] SessionConfigError),
}

/// Minimal snapshot that lets a reload resume the whole-test countdown.
///
/// Not a source of truth: per-question time always comes from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryRecord {
    pub session_id: SessionId,
    pub sizing: TestSizing,
    pub total_time_remaining: Option<u32>,
}

impl RecoveryRecord {
    /// Record written when a session starts: the full allotment is still available.
    #[must_use]
    pub fn started(config: &SessionConfig) -> Self {
        Self {
            session_id: config.session_id().clone(),
            sizing: TestSizing {
                total_questions: config.total_questions(),
                time_per_question: config.time_per_question(),
            },
            total_time_remaining: Some(config.total_allotment_secs()),
        }
    }

    /// # Errors
    ///
    /// Returns `RecoveryRecordError::Config` if the stored sizing is not a valid test.
    pub fn config(&self) -> Result<SessionConfig, RecoveryRecordError> {
        Ok(SessionConfig::new(
            self.session_id.clone(),
            self.sizing.total_questions,
            self.sizing.time_per_question,
        )?)
    }

    /// Encodes a field the way it is written to storage.
    ///
    /// # Errors
    ///
    /// Returns `RecoveryRecordError::Malformed` if the sizing cannot be serialized.
    pub fn encode(&self, key: RecoveryKey) -> Result<Option<String>, RecoveryRecordError> {
        let value = match key {
            RecoveryKey::SessionId => Some(self.session_id.to_string()),
            RecoveryKey::Config => Some(serde_json::to_string(&self.sizing).map_err(|err| {
                RecoveryRecordError::Malformed {
                    key,
                    reason: err.to_string(),
                }
            })?),
            RecoveryKey::TotalTimeRemaining => {
                self.total_time_remaining.map(|secs| secs.to_string())
            }
        };
        Ok(value)
    }

    /// Rebuilds a record from raw stored values.
    ///
    /// Returns `Ok(None)` when no session id is stored.
    ///
    /// # Errors
    ///
    /// Returns `RecoveryRecordError::Malformed` if a present value cannot be parsed.
    pub fn decode(
        session_id: Option<&str>,
        config: Option<&str>,
        total_time_remaining: Option<&str>,
    ) -> Result<Option<Self>, RecoveryRecordError> {
        let Some(session_id) = session_id else {
            return Ok(None);
        };
        let session_id =
            SessionId::new(session_id).map_err(|err| RecoveryRecordError::Malformed {
                key: RecoveryKey::SessionId,
                reason: err.to_string(),
            })?;
        let config = config.ok_or_else(|| RecoveryRecordError::Malformed {
            key: RecoveryKey::Config,
            reason: "missing".to_string(),
        })?;
        let sizing: TestSizing =
            serde_json::from_str(config).map_err(|err| RecoveryRecordError::Malformed {
                key: RecoveryKey::Config,
                reason: err.to_string(),
            })?;
        let total_time_remaining = total_time_remaining
            .map(|raw| {
                raw.trim()
                    .parse::<u32>()
                    .map_err(|err| RecoveryRecordError::Malformed {
                        key: RecoveryKey::TotalTimeRemaining,
                        reason: err.to_string(),
                    })
            })
            .transpose()?;

        Ok(Some(Self {
            session_id,
            sizing,
            total_time_remaining,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> RecoveryRecord {
        let config = SessionConfig::new(SessionId::new("abc").unwrap(), 3, 10).unwrap();
        RecoveryRecord::started(&config)
    }

    #[test]
    fn started_record_holds_full_allotment() {
        assert_eq!(record().total_time_remaining, Some(30));
    }

    #[test]
    fn decode_without_session_is_none() {
        let decoded = RecoveryRecord::decode(None, Some("{}"), Some("42")).unwrap();
        assert!(decoded.is_none());
    }

    #[test]
    fn decode_reads_encoded_fields() {
        let mut original = record();
        original.total_time_remaining = Some(42);
        let session_id = original.encode(RecoveryKey::SessionId).unwrap();
        let config = original.encode(RecoveryKey::Config).unwrap();
        let remaining = original.encode(RecoveryKey::TotalTimeRemaining).unwrap();

        let decoded = RecoveryRecord::decode(
            session_id.as_deref(),
            config.as_deref(),
            remaining.as_deref(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(decoded, original);
        assert_eq!(decoded.config().unwrap().total_allotment_secs(), 30);
    }

    #[test]
    fn decode_rejects_garbage_remaining() {
        let err = RecoveryRecord::decode(
            Some("abc"),
            Some(r#"{"totalQuestions":3,"timePerQuestion":10}"#),
            Some("soon"),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RecoveryRecordError::Malformed {
                key: RecoveryKey::TotalTimeRemaining,
                ..
            }
        ));
    }
}
