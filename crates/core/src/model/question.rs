use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Highest option index the session service accepts.
pub const MAX_OPTION_INDEX: u8 = 3;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question ordinal {ordinal} is outside 1..={total}")]
    OrdinalOutOfRange { ordinal: u32, total: u32 },

    #[error("question has no options")]
    NoOptions,

    #[error("option index {index} is out of range for {len} options")]
    OptionOutOfRange { index: usize, len: usize },
}

/// A selected answer option, bounded by both the displayed options and the
/// service's accepted range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionIndex(u8);

impl OptionIndex {
    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    /// Letter shown next to the option (`A`, `B`, ...).
    #[must_use]
    pub fn label(self) -> char {
        char::from(b'A' + self.0)
    }
}

/// The single question currently shown to the candidate.
///
/// Never carries the correct answer. Discarded on advance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionPresentation {
    ordinal: u32,
    total_questions: u32,
    text: String,
    options: Vec<String>,
    time_remaining: u32,
}

impl QuestionPresentation {
    /// # Errors
    ///
    /// Returns `QuestionError` if the ordinal is not within `1..=total_questions`
    /// or if there are no options.
    pub fn new(
        ordinal: u32,
        total_questions: u32,
        text: impl Into<String>,
        options: Vec<String>,
        time_remaining: u32,
    ) -> Result<Self, QuestionError> {
        if ordinal == 0 || ordinal > total_questions {
            return Err(QuestionError::OrdinalOutOfRange {
                ordinal,
                total: total_questions,
            });
        }
        if options.is_empty() {
            return Err(QuestionError::NoOptions);
        }
        Ok(Self {
            ordinal,
            total_questions,
            text: text.into(),
            options,
            time_remaining,
        })
    }

    /// 1-based position of the question in the test.
    #[must_use]
    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Server-computed seconds left for this question at fetch time.
    #[must_use]
    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.ordinal == self.total_questions
    }

    /// Validates a raw option position against this question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::OptionOutOfRange` if `index` is not a displayed option
    /// or exceeds the range the service accepts.
    pub fn option_index(&self, index: usize) -> Result<OptionIndex, QuestionError> {
        let len = self.options.len();
        let out_of_range = QuestionError::OptionOutOfRange { index, len };
        if index >= len {
            return Err(out_of_range);
        }
        u8::try_from(index)
            .ok()
            .filter(|value| *value <= MAX_OPTION_INDEX)
            .map(OptionIndex)
            .ok_or(out_of_range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("option {i}")).collect()
    }

    #[test]
    fn rejects_ordinal_outside_total() {
        let err = QuestionPresentation::new(0, 3, "Q", options(4), 10).unwrap_err();
        assert!(matches!(err, QuestionError::OrdinalOutOfRange { .. }));
        let err = QuestionPresentation::new(4, 3, "Q", options(4), 10).unwrap_err();
        assert!(matches!(err, QuestionError::OrdinalOutOfRange { .. }));
    }

    #[test]
    fn rejects_question_without_options() {
        let err = QuestionPresentation::new(1, 3, "Q", Vec::new(), 10).unwrap_err();
        assert_eq!(err, QuestionError::NoOptions);
    }

    #[test]
    fn option_index_is_bounded_by_displayed_options() {
        let question = QuestionPresentation::new(1, 3, "Q", options(3), 10).unwrap();
        assert_eq!(question.option_index(2).unwrap().value(), 2);
        assert!(question.option_index(3).is_err());
    }

    #[test]
    fn option_index_is_bounded_by_service_range() {
        let question = QuestionPresentation::new(1, 3, "Q", options(6), 10).unwrap();
        assert!(question.option_index(3).is_ok());
        assert!(question.option_index(4).is_err());
    }

    #[test]
    fn option_labels_are_letters() {
        let question = QuestionPresentation::new(3, 3, "Q", options(4), 10).unwrap();
        assert_eq!(question.option_index(0).unwrap().label(), 'A');
        assert_eq!(question.option_index(3).unwrap().label(), 'D');
        assert!(question.is_last());
    }
}
