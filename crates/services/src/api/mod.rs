//! Boundary to the remote session service.
//!
//! The service is the system of record for sessions, questions and answers.
//! Everything here is a client view of it.

use async_trait::async_trait;

use proctor_core::model::{
    Candidate, LinkId, LinkInfo, OptionIndex, QuestionPresentation, SessionConfig, SessionId,
};

use crate::error::SessionApiError;

mod http;
mod memory;
mod wire;

pub use http::HttpSessionApi;
pub use memory::{InMemorySessionApi, LinkSpec, RecordedAttempt, SeedQuestion};

/// Result of submitting one answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReceipt {
    pub test_completed: bool,
    pub next_question: Option<QuestionPresentation>,
}

impl SubmitReceipt {
    #[must_use]
    pub fn completed() -> Self {
        Self {
            test_completed: true,
            next_question: None,
        }
    }

    #[must_use]
    pub fn next(question: QuestionPresentation) -> Self {
        Self {
            test_completed: false,
            next_question: Some(question),
        }
    }
}

/// Operations the session controller and landing flow need from the service.
#[async_trait]
pub trait SessionApi: Send + Sync {
    /// Public description of a test link.
    async fn validate(&self, link_id: &LinkId) -> Result<LinkInfo, SessionApiError>;

    /// Registers the candidate and opens a session.
    async fn start(
        &self,
        link_id: &LinkId,
        candidate: &Candidate,
    ) -> Result<SessionConfig, SessionApiError>;

    /// The question the session is currently on, with server-computed time left.
    ///
    /// Fails with a sentinel once the session has no question left.
    async fn get_question(
        &self,
        session_id: &SessionId,
    ) -> Result<QuestionPresentation, SessionApiError>;

    /// Answers the current question; `None` means no option was selected.
    async fn submit_answer(
        &self,
        session_id: &SessionId,
        selected: Option<OptionIndex>,
    ) -> Result<SubmitReceipt, SessionApiError>;

    /// Records one focus-lost event. Returns whether the service logged it.
    async fn log_tab_switch(&self, session_id: &SessionId) -> Result<bool, SessionApiError>;
}
