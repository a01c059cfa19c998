use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use proctor_core::Countdown;
use proctor_core::model::{
    AnswerSubmission, OptionIndex, QuestionError, QuestionPresentation, RecoveryKey,
    SessionConfig, SubmitCause,
};
use storage::repository::{RecoveryStore, load_record};

use super::guard::SubmissionGuard;
use crate::api::{SessionApi, SubmitReceipt};
use crate::error::SessionApiError;

/// Per-question window used until a session config is loaded.
pub const DEFAULT_TIME_PER_QUESTION: u32 = 10;

//
// ─── PHASE AND SNAPSHOT ────────────────────────────────────────────────────────
//

/// Where the running attempt is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    Idle,
    Loading,
    AnsweringQuestion,
    Submitting,
    Completing,
    Completed,
    Errored,
    RedirectToLanding,
}

impl SessionPhase {
    /// Terminal phases end the attempt in this window.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Errored | Self::RedirectToLanding)
    }
}

/// Everything the test view renders, taken at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub question: Option<QuestionPresentation>,
    pub selected: Option<OptionIndex>,
    pub question_remaining: u32,
    /// Question time left relative to the value the question timer was armed with.
    pub question_percent: f64,
    pub total_remaining: u32,
    pub total_allotment: u32,
    pub error: Option<String>,
}

impl SessionSnapshot {
    #[must_use]
    pub fn idle() -> Self {
        Self {
            phase: SessionPhase::Idle,
            question: None,
            selected: None,
            question_remaining: DEFAULT_TIME_PER_QUESTION,
            question_percent: 100.0,
            total_remaining: 0,
            total_allotment: 0,
            error: None,
        }
    }

    /// The submit control is only live while a question is being answered.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.phase == SessionPhase::AnsweringQuestion && self.question.is_some()
    }

    #[must_use]
    pub fn total_percent(&self) -> f64 {
        if self.total_allotment == 0 {
            return 0.0;
        }
        (f64::from(self.total_remaining) / f64::from(self.total_allotment) * 100.0)
            .clamp(0.0, 100.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerExpiry {
    Question(u32),
    Test,
}

//
// ─── CONTROLLER ────────────────────────────────────────────────────────────────
//

/// Drives one attempt: fetches questions, runs both countdowns and submits
/// answers, forcing a submission whenever time runs out.
///
/// The controller is single-owner. Time passes only through [`SessionController::tick`],
/// which the runner calls once per second; countdown expiries are queued and
/// handled on the same tick so a stale expiry can be told apart from a live one.
///
/// Every state change is published to [`SessionController::subscribe`] as it
/// happens, so `Loading` and `Submitting` are visible while a request is in flight.
pub struct SessionController {
    api: Arc<dyn SessionApi>,
    recovery: Arc<dyn RecoveryStore>,
    phase: SessionPhase,
    config: Option<SessionConfig>,
    question: Option<QuestionPresentation>,
    selected: Option<OptionIndex>,
    question_timer: Countdown,
    total_timer: Countdown,
    total_started: bool,
    guard: SubmissionGuard,
    expiry_tx: UnboundedSender<TimerExpiry>,
    expiry_rx: UnboundedReceiver<TimerExpiry>,
    dispatched: Vec<AnswerSubmission>,
    error: Option<String>,
    snapshots: watch::Sender<SessionSnapshot>,
}

impl SessionController {
    #[must_use]
    pub fn new(api: Arc<dyn SessionApi>, recovery: Arc<dyn RecoveryStore>) -> Self {
        let (expiry_tx, expiry_rx) = mpsc::unbounded_channel();
        let (snapshots, _) = watch::channel(SessionSnapshot::idle());
        Self {
            api,
            recovery,
            phase: SessionPhase::Idle,
            config: None,
            question: None,
            selected: None,
            question_timer: Countdown::new(DEFAULT_TIME_PER_QUESTION),
            total_timer: Countdown::new(0),
            total_started: false,
            guard: SubmissionGuard::new(),
            expiry_tx,
            expiry_rx,
            dispatched: Vec::new(),
            error: None,
            snapshots,
        }
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn config(&self) -> Option<&SessionConfig> {
        self.config.as_ref()
    }

    #[must_use]
    pub fn guard(&self) -> SubmissionGuard {
        self.guard.clone()
    }

    /// Answers dispatched by this controller, in order.
    #[must_use]
    pub fn dispatched(&self) -> &[AnswerSubmission] {
        &self.dispatched
    }

    /// Live view of the controller, updated on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.subscribe()
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            question: self.question.clone(),
            selected: self.selected,
            question_remaining: self.question_timer.remaining(),
            question_percent: self.question_timer.percent_remaining(),
            total_remaining: self.total_timer.remaining(),
            total_allotment: self
                .config
                .as_ref()
                .map_or(0, SessionConfig::total_allotment_secs),
            error: self.error.clone(),
        }
    }

    /// Resumes the attempt recorded in the recovery store.
    ///
    /// Without a usable record the controller goes to `RedirectToLanding`
    /// and never contacts the service.
    pub async fn enter(&mut self) -> SessionPhase {
        if self.phase != SessionPhase::Idle {
            return self.phase;
        }

        let loaded = load_record(self.recovery.as_ref()).await;
        let record = match loaded {
            Ok(Some(record)) => record,
            Ok(None) => {
                info!("no active session in this window");
                self.set_phase(SessionPhase::RedirectToLanding);
                return self.phase;
            }
            Err(err) => {
                warn!(error = %err, "discarding unreadable recovery record");
                self.discard_recovery().await;
                self.set_phase(SessionPhase::RedirectToLanding);
                return self.phase;
            }
        };
        let config = match record.config() {
            Ok(config) => config,
            Err(err) => {
                warn!(error = %err, "discarding recovery record with invalid sizing");
                self.discard_recovery().await;
                self.set_phase(SessionPhase::RedirectToLanding);
                return self.phase;
            }
        };

        let total = record
            .total_time_remaining
            .unwrap_or_else(|| config.total_allotment_secs());
        info!(
            session_id = %config.session_id(),
            total_remaining = total,
            "entering session"
        );
        self.question_timer = Countdown::new(config.time_per_question());
        self.total_timer = Countdown::new(total);
        let tx = self.expiry_tx.clone();
        self.total_timer.set_on_expire(move || {
            let _ = tx.send(TimerExpiry::Test);
        });
        self.config = Some(config);

        self.load_question().await;
        self.phase
    }

    /// Records the candidate's choice for the question numbered `ordinal`.
    ///
    /// Ignored unless that question is the one being answered.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::OptionOutOfRange` for an index that is not a displayed option.
    pub fn select(&mut self, ordinal: u32, index: Option<usize>) -> Result<(), QuestionError> {
        if self.phase != SessionPhase::AnsweringQuestion {
            return Ok(());
        }
        let Some(question) = &self.question else {
            return Ok(());
        };
        if question.ordinal() != ordinal {
            debug!(ordinal, current = question.ordinal(), "dropping stale selection");
            return Ok(());
        }
        self.selected = index.map(|index| question.option_index(index)).transpose()?;
        self.publish();
        Ok(())
    }

    /// Candidate-initiated submit for the question numbered `ordinal`.
    ///
    /// Dropped if that question is no longer the one being answered or was
    /// already submitted.
    pub async fn submit(&mut self, ordinal: u32) -> SessionPhase {
        let current = self.question.as_ref().map(QuestionPresentation::ordinal);
        if self.phase != SessionPhase::AnsweringQuestion || current != Some(ordinal) {
            debug!(ordinal, ?current, phase = ?self.phase, "dropping stale submit");
            return self.phase;
        }
        self.dispatch(SubmitCause::User).await;
        self.phase
    }

    /// Advances both countdowns by one second and handles whatever expired.
    ///
    /// The whole-test expiry wins over a per-question expiry on the same tick.
    pub async fn tick(&mut self) -> SessionPhase {
        if self.phase != SessionPhase::AnsweringQuestion {
            return self.phase;
        }

        self.total_timer.tick();
        self.question_timer.tick();
        self.publish();
        self.persist_total().await;

        let mut test_expired = false;
        let mut question_expired = None;
        while let Ok(expiry) = self.expiry_rx.try_recv() {
            match expiry {
                TimerExpiry::Test => test_expired = true,
                TimerExpiry::Question(ordinal) => question_expired = Some(ordinal),
            }
        }

        if test_expired {
            self.finish_on_time().await;
        } else if let Some(ordinal) = question_expired {
            let current = self.question.as_ref().map(QuestionPresentation::ordinal);
            if current == Some(ordinal) {
                info!(ordinal, "question time expired");
                self.dispatch(SubmitCause::QuestionExpired).await;
            } else {
                debug!(ordinal, ?current, "ignoring expiry for a question no longer shown");
            }
        }
        self.phase
    }

    async fn load_question(&mut self) {
        let Some(session_id) = self.config.as_ref().map(|c| c.session_id().clone()) else {
            return;
        };
        self.set_phase(SessionPhase::Loading);
        match self.api.get_question(&session_id).await {
            Ok(question) => self.present(question),
            Err(err) if err.is_sentinel() => {
                info!(error = %err, "session has no question left");
                self.complete().await;
            }
            Err(err) => self.fail(&err),
        }
    }

    fn present(&mut self, question: QuestionPresentation) {
        let ordinal = question.ordinal();
        debug!(ordinal, time_remaining = question.time_remaining(), "presenting question");

        self.selected = None;
        let tx = self.expiry_tx.clone();
        self.question_timer.set_on_expire(move || {
            let _ = tx.send(TimerExpiry::Question(ordinal));
        });
        let remaining = i64::from(question.time_remaining());
        self.question = Some(question);
        self.question_timer.start(Some(remaining));

        if !self.total_started {
            self.total_started = true;
            let total = i64::from(self.total_timer.remaining());
            self.total_timer.start(Some(total));
        }
        self.set_phase(SessionPhase::AnsweringQuestion);
    }

    async fn dispatch(&mut self, cause: SubmitCause) {
        let Some(submission) = self.claim(cause) else {
            return;
        };
        self.set_phase(SessionPhase::Submitting);

        let result = self
            .api
            .submit_answer(&submission.session_id, submission.selected)
            .await;
        match result {
            Ok(SubmitReceipt {
                test_completed: true,
                ..
            }) => self.complete().await,
            Ok(SubmitReceipt {
                next_question: Some(question),
                ..
            }) => self.present(question),
            Ok(SubmitReceipt {
                next_question: None,
                ..
            }) => self.load_question().await,
            Err(err) if err.is_sentinel() => {
                info!(error = %err, "session closed by the service");
                self.complete().await;
            }
            Err(err) => self.fail(&err),
        }
    }

    /// Claims the current ordinal and records the submission about to be sent.
    fn claim(&mut self, cause: SubmitCause) -> Option<AnswerSubmission> {
        let session_id = self.config.as_ref()?.session_id().clone();
        let ordinal = self.question.as_ref()?.ordinal();
        if !self.guard.try_claim(ordinal) {
            debug!(ordinal, ?cause, "submission already dispatched");
            return None;
        }
        self.question_timer.stop();

        let submission = AnswerSubmission {
            session_id,
            ordinal,
            selected: self.selected,
            cause,
        };
        debug!(
            ordinal,
            ?cause,
            selected = ?submission.selected.map(OptionIndex::value),
            "submitting answer"
        );
        self.dispatched.push(submission.clone());
        Some(submission)
    }

    async fn finish_on_time(&mut self) {
        info!("total test time exhausted");
        self.question_timer.stop();
        if let Some(submission) = self.claim(SubmitCause::TestExpired) {
            self.set_phase(SessionPhase::Submitting);
            if let Err(err) = self
                .api
                .submit_answer(&submission.session_id, submission.selected)
                .await
            {
                warn!(error = %err, "final answer was not accepted");
            }
        }
        self.complete().await;
    }

    async fn complete(&mut self) {
        self.set_phase(SessionPhase::Completing);
        self.question_timer.stop();
        self.total_timer.stop();
        self.question_timer.clear_on_expire();
        self.total_timer.clear_on_expire();
        self.discard_recovery().await;
        if let Some(config) = &self.config {
            info!(session_id = %config.session_id(), "session completed");
        }
        self.set_phase(SessionPhase::Completed);
    }

    fn fail(&mut self, err: &SessionApiError) {
        warn!(error = %err, "session request failed");
        self.question_timer.stop();
        self.total_timer.stop();
        self.error = Some(err.message());
        self.set_phase(SessionPhase::Errored);
    }

    fn set_phase(&mut self, phase: SessionPhase) {
        self.phase = phase;
        self.publish();
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.snapshot());
    }

    async fn persist_total(&mut self) {
        let remaining = self.total_timer.remaining().to_string();
        if let Err(err) = self
            .recovery
            .put(RecoveryKey::TotalTimeRemaining, &remaining)
            .await
        {
            warn!(error = %err, "could not persist remaining test time");
        }
    }

    async fn discard_recovery(&mut self) {
        if let Err(err) = self.recovery.clear().await {
            warn!(error = %err, "could not clear recovery record");
        }
    }
}
