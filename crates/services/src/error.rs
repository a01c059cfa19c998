//! Shared error types for the services crate.

use thiserror::Error;

use proctor_core::model::CandidateError;
use storage::repository::StorageError;

/// Detail text the session service uses when every question has been answered.
pub const NO_MORE_QUESTIONS: &str = "No more questions";
/// Detail text the session service uses once a session is finished.
pub const ALREADY_COMPLETED: &str = "Test already completed";

/// Errors emitted by a `SessionApi` implementation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionApiError {
    #[error("{NO_MORE_QUESTIONS}")]
    NoMoreQuestions,
    #[error("{ALREADY_COMPLETED}")]
    AlreadyCompleted,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("expired: {0}")]
    Expired(String),
    #[error("rejected with status {status}: {detail}")]
    Rejected { status: u16, detail: String },
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl SessionApiError {
    /// Classifies a refusal from its status code and `detail` text.
    #[must_use]
    pub fn from_detail(status: u16, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        match detail.as_str() {
            NO_MORE_QUESTIONS => Self::NoMoreQuestions,
            ALREADY_COMPLETED => Self::AlreadyCompleted,
            _ if status == 404 => Self::NotFound(detail),
            _ if detail.to_ascii_lowercase().contains("expired") => Self::Expired(detail),
            _ => Self::Rejected { status, detail },
        }
    }

    /// Sentinel refusals mean the attempt is over, not that something broke.
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Self::NoMoreQuestions | Self::AlreadyCompleted)
    }

    /// Text shown to the candidate. Uses the service's own wording when there is one.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::NoMoreQuestions => NO_MORE_QUESTIONS.to_string(),
            Self::AlreadyCompleted => ALREADY_COMPLETED.to_string(),
            Self::NotFound(detail) | Self::Expired(detail) | Self::Rejected { detail, .. } => {
                detail.clone()
            }
            Self::Transport(_) => "Could not reach the assessment service".to_string(),
            Self::Decode(_) => "Unexpected response from the assessment service".to_string(),
        }
    }
}

impl From<proctor_core::Error> for SessionApiError {
    fn from(err: proctor_core::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Errors emitted by the landing and registration flow.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RegistrationError {
    #[error(transparent)]
    Candidate(#[from] CandidateError),
    #[error(transparent)]
    Api(#[from] SessionApiError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl RegistrationError {
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Candidate(err) => err.to_string(),
            Self::Api(err) => err.message(),
            Self::Storage(_) => "Could not save test progress on this device".to_string(),
        }
    }
}

/// Errors emitted while reading service configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid service url `{raw}`: {reason}")]
    InvalidUrl { raw: String, reason: String },
    #[error("invalid request timeout `{raw}`")]
    InvalidTimeout { raw: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_details_map_to_sentinels() {
        assert!(SessionApiError::from_detail(400, "No more questions").is_sentinel());
        assert!(SessionApiError::from_detail(400, "Test already completed").is_sentinel());
        assert!(!SessionApiError::from_detail(404, "Session not found").is_sentinel());
    }

    #[test]
    fn refusals_keep_the_service_wording() {
        let err = SessionApiError::from_detail(404, "Test link not found");
        assert!(matches!(err, SessionApiError::NotFound(_)));
        assert_eq!(err.message(), "Test link not found");

        let err = SessionApiError::from_detail(400, "This test link has expired");
        assert!(matches!(err, SessionApiError::Expired(_)));

        let err =
            SessionApiError::from_detail(400, "This test link has reached its maximum number of uses");
        assert!(matches!(err, SessionApiError::Rejected { status: 400, .. }));
        assert_eq!(
            err.message(),
            "This test link has reached its maximum number of uses"
        );
    }
}
