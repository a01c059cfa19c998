use serde::{Deserialize, Serialize};
use serde_json::Value;

use proctor_core::model::{
    Candidate, LinkId, LinkInfo, QuestionPresentation, SessionConfig, SessionId,
};

use crate::api::SubmitReceipt;
use crate::error::SessionApiError;

#[derive(Debug, Deserialize)]
pub(crate) struct ValidateResponse {
    pub test_name: String,
    pub total_questions: u32,
    pub time_per_question: u32,
}

impl ValidateResponse {
    pub(crate) fn into_link_info(self, link_id: LinkId) -> LinkInfo {
        LinkInfo {
            link_id,
            test_name: self.test_name,
            total_questions: self.total_questions,
            time_per_question: self.time_per_question,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct StartRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
}

impl<'a> From<&'a Candidate> for StartRequest<'a> {
    fn from(candidate: &'a Candidate) -> Self {
        Self {
            name: candidate.name(),
            email: candidate.email(),
            phone: candidate.phone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct StartResponse {
    pub session_id: String,
    pub total_questions: u32,
    pub time_per_question: u32,
}

impl StartResponse {
    pub(crate) fn into_config(self) -> Result<SessionConfig, SessionApiError> {
        let session_id = SessionId::new(self.session_id).map_err(proctor_core::Error::from)?;
        let config = SessionConfig::new(session_id, self.total_questions, self.time_per_question)
            .map_err(proctor_core::Error::from)?;
        Ok(config)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuestionResponse {
    pub question_text: String,
    pub options: Vec<String>,
    pub question_number: u32,
    pub total_questions: u32,
    pub time_remaining: i64,
}

impl QuestionResponse {
    pub(crate) fn into_presentation(self) -> Result<QuestionPresentation, SessionApiError> {
        let remaining = u32::try_from(self.time_remaining.max(0)).unwrap_or(u32::MAX);
        let question = QuestionPresentation::new(
            self.question_number,
            self.total_questions,
            self.question_text,
            self.options,
            remaining,
        )
        .map_err(proctor_core::Error::from)?;
        Ok(question)
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmitRequest {
    pub selected_index: Option<u8>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitResponse {
    #[serde(default)]
    pub next_question: Option<QuestionResponse>,
    #[serde(default)]
    pub test_completed: bool,
}

impl SubmitResponse {
    pub(crate) fn into_receipt(self) -> Result<SubmitReceipt, SessionApiError> {
        let next_question = self
            .next_question
            .map(QuestionResponse::into_presentation)
            .transpose()?;
        Ok(SubmitReceipt {
            test_completed: self.test_completed,
            next_question,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TabSwitchResponse {
    #[serde(default)]
    pub logged: bool,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Value,
}

/// Extracts the human-readable `detail` from an error body.
///
/// Validation failures carry a list of objects with a `msg` field; those are joined.
pub(crate) fn error_detail(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail {
        Value::String(detail) => Some(detail),
        Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_payload_clamps_negative_time() {
        let payload = r#"{
            "question_text": "2 + 2?",
            "options": ["3", "4", "5", "22"],
            "question_number": 2,
            "total_questions": 3,
            "time_remaining": -4
        }"#;
        let question = serde_json::from_str::<QuestionResponse>(payload)
            .unwrap()
            .into_presentation()
            .unwrap();
        assert_eq!(question.ordinal(), 2);
        assert_eq!(question.time_remaining(), 0);
        assert_eq!(question.options().len(), 4);
    }

    #[test]
    fn question_payload_with_bad_ordinal_is_a_decode_error() {
        let payload = r#"{
            "question_text": "?",
            "options": ["a"],
            "question_number": 4,
            "total_questions": 3,
            "time_remaining": 5
        }"#;
        let err = serde_json::from_str::<QuestionResponse>(payload)
            .unwrap()
            .into_presentation()
            .unwrap_err();
        assert!(matches!(err, SessionApiError::Decode(_)));
    }

    #[test]
    fn completed_submit_has_no_next_question() {
        let payload = r#"{"success": true, "next_question": null, "test_completed": true, "message": "done"}"#;
        let receipt = serde_json::from_str::<SubmitResponse>(payload)
            .unwrap()
            .into_receipt()
            .unwrap();
        assert_eq!(receipt, SubmitReceipt::completed());
    }

    #[test]
    fn null_selection_serializes_as_null() {
        let body = serde_json::to_string(&SubmitRequest {
            selected_index: None,
        })
        .unwrap();
        assert_eq!(body, r#"{"selected_index":null}"#);
    }

    #[test]
    fn error_detail_handles_strings_and_validation_lists() {
        assert_eq!(
            error_detail(r#"{"detail": "No more questions"}"#).as_deref(),
            Some("No more questions")
        );
        assert_eq!(
            error_detail(r#"{"detail": [{"msg": "field required"}, {"msg": "too short"}]}"#)
                .as_deref(),
            Some("field required; too short")
        );
        assert_eq!(error_detail("<html>bad gateway</html>"), None);
    }
}
