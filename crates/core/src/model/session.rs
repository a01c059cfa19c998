use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{LinkId, SessionId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionConfigError {
    #[error("a test needs at least one question")]
    NoQuestions,

    #[error("time per question must be positive")]
    NoTimePerQuestion,
}

/// Public description of a test link, shown on the instructions screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkInfo {
    pub link_id: LinkId,
    pub test_name: String,
    pub total_questions: u32,
    pub time_per_question: u32,
}

/// The client's cached copy of a running session.
///
/// Used for rendering and local countdown arithmetic only; the remote session
/// service stays the system of record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    session_id: SessionId,
    total_questions: u32,
    time_per_question: u32,
}

impl SessionConfig {
    /// # Errors
    ///
    /// Returns `SessionConfigError` if the question count or per-question time is zero.
    pub fn new(
        session_id: SessionId,
        total_questions: u32,
        time_per_question: u32,
    ) -> Result<Self, SessionConfigError> {
        if total_questions == 0 {
            return Err(SessionConfigError::NoQuestions);
        }
        if time_per_question == 0 {
            return Err(SessionConfigError::NoTimePerQuestion);
        }
        Ok(Self {
            session_id,
            total_questions,
            time_per_question,
        })
    }

    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn time_per_question(&self) -> u32 {
        self.time_per_question
    }

    /// Whole-test allotment: one full per-question window for every question.
    #[must_use]
    pub fn total_allotment_secs(&self) -> u32 {
        self.total_questions.saturating_mul(self.time_per_question)
    }
}

/// Sizing of a test as written to tab-scoped storage under the `config` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSizing {
    pub total_questions: u32,
    pub time_per_question: u32,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CandidateError {
    #[error("name must be between 2 and 100 characters")]
    InvalidName,

    #[error("enter a valid email address")]
    InvalidEmail,

    #[error("phone number must be between 10 and 15 characters")]
    InvalidPhone,
}

/// Registration details a candidate enters before starting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    name: String,
    email: String,
    phone: String,
}

impl Candidate {
    /// Validates registration fields with the same bounds the session service enforces.
    ///
    /// # Errors
    ///
    /// Returns the first `CandidateError` found, checking name, email, then phone.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> Result<Self, CandidateError> {
        let name = name.into().trim().to_string();
        let email = email.into().trim().to_string();
        let phone = phone.into().trim().to_string();

        let name_len = name.chars().count();
        if !(2..=100).contains(&name_len) {
            return Err(CandidateError::InvalidName);
        }
        if !is_plausible_email(&email) {
            return Err(CandidateError::InvalidEmail);
        }
        let phone_len = phone.chars().count();
        if !(10..=15).contains(&phone_len) {
            return Err(CandidateError::InvalidPhone);
        }

        Ok(Self { name, email, phone })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn phone(&self) -> &str {
        &self.phone
    }
}

fn is_plausible_email(value: &str) -> bool {
    let mut parts = value.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty() && !domain.is_empty() && !value.contains(char::is_whitespace)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_id() -> SessionId {
        SessionId::new("s-1").unwrap()
    }

    #[test]
    fn config_rejects_empty_test() {
        assert_eq!(
            SessionConfig::new(session_id(), 0, 10).unwrap_err(),
            SessionConfigError::NoQuestions
        );
        assert_eq!(
            SessionConfig::new(session_id(), 3, 0).unwrap_err(),
            SessionConfigError::NoTimePerQuestion
        );
    }

    #[test]
    fn total_allotment_is_questions_times_seconds() {
        let config = SessionConfig::new(session_id(), 3, 10).unwrap();
        assert_eq!(config.total_allotment_secs(), 30);
    }

    #[test]
    fn sizing_uses_camel_case_keys() {
        let sizing = TestSizing {
            total_questions: 3,
            time_per_question: 10,
        };
        let json = serde_json::to_string(&sizing).unwrap();
        assert_eq!(json, r#"{"totalQuestions":3,"timePerQuestion":10}"#);
    }

    #[test]
    fn candidate_validation_checks_each_field() {
        assert!(Candidate::new("Ada Lovelace", "ada@example.com", "5550100200").is_ok());
        assert_eq!(
            Candidate::new("A", "ada@example.com", "5550100200").unwrap_err(),
            CandidateError::InvalidName
        );
        assert_eq!(
            Candidate::new("Ada", "ada.example.com", "5550100200").unwrap_err(),
            CandidateError::InvalidEmail
        );
        assert_eq!(
            Candidate::new("Ada", "ada@@example.com", "5550100200").unwrap_err(),
            CandidateError::InvalidEmail
        );
        assert_eq!(
            Candidate::new("Ada", "ada@example.com", "555").unwrap_err(),
            CandidateError::InvalidPhone
        );
    }

    #[test]
    fn candidate_fields_are_trimmed() {
        let candidate = Candidate::new("  Ada  ", " ada@example.com ", " 5550100200 ").unwrap();
        assert_eq!(candidate.name(), "Ada");
        assert_eq!(candidate.email(), "ada@example.com");
        assert_eq!(candidate.phone(), "5550100200");
    }
}
