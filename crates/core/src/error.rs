use thiserror::Error;

use crate::model::{
    CandidateError, ParseIdError, QuestionError, RecoveryRecordError, SessionConfigError,
};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Id(#[from] ParseIdError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Config(#[from] SessionConfigError),
    #[error(transparent)]
    Candidate(#[from] CandidateError),
    #[error(transparent)]
    Recovery(#[from] RecoveryRecordError),
}
