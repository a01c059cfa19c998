use chrono::{DateTime, Utc};

use crate::model::{OptionIndex, SessionId};

/// What caused an answer to be sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubmitCause {
    /// The candidate pressed the submit control.
    User,
    /// The per-question countdown reached zero.
    QuestionExpired,
    /// The whole-test countdown reached zero.
    TestExpired,
}

impl SubmitCause {
    /// Forced submissions come from a timer rather than the candidate.
    #[must_use]
    pub fn is_forced(self) -> bool {
        !matches!(self, Self::User)
    }
}

/// One answer for one question ordinal.
///
/// At most one of these is dispatched per ordinal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerSubmission {
    pub session_id: SessionId,
    pub ordinal: u32,
    pub selected: Option<OptionIndex>,
    pub cause: SubmitCause,
}

/// A focus-lost occurrence reported for a session. Append-only, best effort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityEvent {
    pub session_id: SessionId,
    pub occurred_at: DateTime<Utc>,
}

impl IntegrityEvent {
    #[must_use]
    pub fn focus_lost(session_id: SessionId, occurred_at: DateTime<Utc>) -> Self {
        Self {
            session_id,
            occurred_at,
        }
    }
}
