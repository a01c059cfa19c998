mod answer;
mod ids;
mod question;
mod recovery;
mod session;

pub use ids::{LinkId, ParseIdError, SessionId, TabScope};

pub use answer::{AnswerSubmission, IntegrityEvent, SubmitCause};
pub use question::{MAX_OPTION_INDEX, OptionIndex, QuestionError, QuestionPresentation};
pub use recovery::{RecoveryKey, RecoveryRecord, RecoveryRecordError};
pub use session::{
    Candidate, CandidateError, LinkInfo, SessionConfig, SessionConfigError, TestSizing,
};
