use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::SeedableRng;

use proctor_core::Clock;
use proctor_core::model::{
    Candidate, IntegrityEvent, LinkId, LinkInfo, OptionIndex, QuestionPresentation,
    SessionConfig, SessionId,
};

use super::{SessionApi, SubmitReceipt};
use crate::error::{ALREADY_COMPLETED, NO_MORE_QUESTIONS, SessionApiError};

/// A question in a link's pool. `correct_index` refers to `options` as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedQuestion {
    pub text: String,
    pub options: Vec<String>,
    pub correct_index: u8,
}

impl SeedQuestion {
    #[must_use]
    pub fn new(text: impl Into<String>, options: &[&str], correct_index: u8) -> Self {
        Self {
            text: text.into(),
            options: options.iter().map(|option| (*option).to_string()).collect(),
            correct_index,
        }
    }
}

/// Everything the fake service knows about one test link.
#[derive(Debug, Clone)]
pub struct LinkSpec {
    pub test_name: String,
    pub time_per_question: u32,
    pub total_questions: u32,
    pub pool: Vec<SeedQuestion>,
    pub expires_at: Option<DateTime<Utc>>,
    /// `0` means unlimited.
    pub max_uses: u32,
    pub shuffle: bool,
}

impl LinkSpec {
    /// Serves every pool question in order with unshuffled options.
    #[must_use]
    pub fn new(test_name: impl Into<String>, time_per_question: u32, pool: Vec<SeedQuestion>) -> Self {
        let total_questions = u32::try_from(pool.len()).unwrap_or(u32::MAX);
        Self {
            test_name: test_name.into(),
            time_per_question,
            total_questions,
            pool,
            expires_at: None,
            max_uses: 0,
            shuffle: false,
        }
    }

    /// Draws a random subset of the pool and shuffles options per session.
    #[must_use]
    pub fn shuffled(mut self) -> Self {
        self.shuffle = true;
        self
    }

    #[must_use]
    pub fn with_total_questions(mut self, total_questions: u32) -> Self {
        self.total_questions = total_questions;
        self
    }

    #[must_use]
    pub fn expiring_at(mut self, at: DateTime<Utc>) -> Self {
        self.expires_at = Some(at);
        self
    }

    #[must_use]
    pub fn with_max_uses(mut self, max_uses: u32) -> Self {
        self.max_uses = max_uses;
        self
    }
}

/// One stored answer, as an administrator would later see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedAttempt {
    pub ordinal: u32,
    pub selected: Option<OptionIndex>,
    pub is_correct: bool,
    pub auto_submitted: bool,
    pub time_taken: u32,
}

#[derive(Debug, Clone)]
struct ServedQuestion {
    text: String,
    options: Vec<String>,
    correct_index: u8,
}

#[derive(Debug)]
struct MemorySession {
    link_id: LinkId,
    email: String,
    questions: Vec<ServedQuestion>,
    current_index: usize,
    question_started_at: DateTime<Utc>,
    completed: bool,
    attempts: Vec<RecordedAttempt>,
    tab_switches: Vec<IntegrityEvent>,
}

#[derive(Debug)]
struct MemoryLink {
    spec: LinkSpec,
    uses: u32,
}

struct MemoryState {
    clock: Clock,
    rng: StdRng,
    links: HashMap<LinkId, MemoryLink>,
    sessions: HashMap<SessionId, MemorySession>,
    next_session: u64,
    submit_calls: u32,
    failing_submits: u32,
    failing_tab_switches: bool,
}

/// In-process stand-in for the remote session service.
///
/// Keeps its own clock so tests decide when time passes, and records every
/// answer and focus-lost event it receives.
#[derive(Clone)]
pub struct InMemorySessionApi {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemorySessionApi {
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self::with_seed(clock, 7)
    }

    /// Same as [`InMemorySessionApi::new`] with a chosen shuffle seed.
    #[must_use]
    pub fn with_seed(clock: Clock, seed: u64) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState {
                clock,
                rng: StdRng::seed_from_u64(seed),
                links: HashMap::new(),
                sessions: HashMap::new(),
                next_session: 1,
                submit_calls: 0,
                failing_submits: 0,
                failing_tab_switches: false,
            })),
        }
    }

    /// A service with one `demo` link for running the desktop app offline.
    #[must_use]
    pub fn demo() -> Self {
        let api = Self::new(Clock::default_clock());
        let pool = vec![
            SeedQuestion::new(
                "Which keyword declares an immutable binding in Rust?",
                &["let", "mut", "static", "const fn"],
                0,
            ),
            SeedQuestion::new(
                "What does `Option::None` represent?",
                &["An error", "The absence of a value", "A null pointer", "Zero"],
                1,
            ),
            SeedQuestion::new(
                "Which trait enables the `?` operator on a custom error conversion?",
                &["Into", "AsRef", "From", "Deref"],
                2,
            ),
            SeedQuestion::new(
                "How many owners can a value have at one time?",
                &["Unlimited", "Two", "Zero", "One"],
                3,
            ),
            SeedQuestion::new(
                "Which collection keeps keys sorted?",
                &["HashMap", "BTreeMap", "Vec", "VecDeque"],
                1,
            ),
        ];
        if let Ok(link_id) = LinkId::new("demo") {
            api.add_link(
                link_id,
                LinkSpec::new("Rust Fundamentals", 30, pool)
                    .with_total_questions(3)
                    .shuffled(),
            );
        }
        api
    }

    pub fn add_link(&self, link_id: LinkId, spec: LinkSpec) {
        if let Ok(mut state) = self.state.lock() {
            state.links.insert(link_id, MemoryLink { spec, uses: 0 });
        }
    }

    /// Moves the service clock forward. No effect on a system clock.
    pub fn advance(&self, delta: Duration) {
        if let Ok(mut state) = self.state.lock() {
            state.clock.advance(delta);
        }
    }

    /// The next `count` submissions fail with a 503 without being recorded.
    pub fn fail_next_submits(&self, count: u32) {
        if let Ok(mut state) = self.state.lock() {
            state.failing_submits = count;
        }
    }

    pub fn fail_tab_switches(&self, failing: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.failing_tab_switches = failing;
        }
    }

    /// Every `submit_answer` call received, including failed ones.
    #[must_use]
    pub fn submit_calls(&self) -> u32 {
        self.state.lock().map(|state| state.submit_calls).unwrap_or(0)
    }

    #[must_use]
    pub fn attempts(&self, session_id: &SessionId) -> Vec<RecordedAttempt> {
        self.state
            .lock()
            .ok()
            .and_then(|state| {
                state
                    .sessions
                    .get(session_id)
                    .map(|session| session.attempts.clone())
            })
            .unwrap_or_default()
    }

    #[must_use]
    pub fn tab_switches(&self, session_id: &SessionId) -> Vec<IntegrityEvent> {
        self.state
            .lock()
            .ok()
            .and_then(|state| {
                state
                    .sessions
                    .get(session_id)
                    .map(|session| session.tab_switches.clone())
            })
            .unwrap_or_default()
    }

    #[must_use]
    pub fn is_completed(&self, session_id: &SessionId) -> bool {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.sessions.get(session_id).map(|session| session.completed))
            .unwrap_or(false)
    }

    /// The displayed position of the correct option for `ordinal`.
    #[must_use]
    pub fn correct_option(&self, session_id: &SessionId, ordinal: u32) -> Option<OptionIndex> {
        let state = self.state.lock().ok()?;
        let session = state.sessions.get(session_id)?;
        let index = usize::try_from(ordinal.checked_sub(1)?).ok()?;
        let question = session.questions.get(index)?;
        let presentation = QuestionPresentation::new(
            ordinal,
            u32::try_from(session.questions.len()).ok()?,
            question.text.clone(),
            question.options.clone(),
            0,
        )
        .ok()?;
        presentation
            .option_index(usize::from(question.correct_index))
            .ok()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, SessionApiError> {
        self.state.lock().map_err(|_| SessionApiError::Rejected {
            status: 500,
            detail: "session store unavailable".into(),
        })
    }
}

impl MemoryState {
    fn check_link(&self, link_id: &LinkId) -> Result<&MemoryLink, SessionApiError> {
        let link = self
            .links
            .get(link_id)
            .ok_or_else(|| SessionApiError::from_detail(404, "Test link not found"))?;
        if link.spec.max_uses > 0 && link.uses >= link.spec.max_uses {
            return Err(SessionApiError::from_detail(
                400,
                "This test link has reached its maximum number of uses",
            ));
        }
        if link
            .spec
            .expires_at
            .is_some_and(|expires_at| expires_at < self.clock.now())
        {
            return Err(SessionApiError::from_detail(400, "This test link has expired"));
        }
        Ok(link)
    }

    fn open_session(&mut self, session_id: &SessionId) -> Result<&mut MemorySession, SessionApiError> {
        let session = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| SessionApiError::from_detail(404, "Session not found"))?;
        if session.completed {
            return Err(SessionApiError::from_detail(400, ALREADY_COMPLETED));
        }
        if session.current_index >= session.questions.len() {
            return Err(SessionApiError::from_detail(400, NO_MORE_QUESTIONS));
        }
        Ok(session)
    }

    fn serve_questions(&mut self, spec: &LinkSpec) -> Result<Vec<ServedQuestion>, SessionApiError> {
        let total = usize::try_from(spec.total_questions).unwrap_or(usize::MAX);
        if total == 0 || spec.pool.len() < total {
            return Err(SessionApiError::from_detail(
                400,
                "Not enough questions available for this test",
            ));
        }
        let picked: Vec<SeedQuestion> = if spec.shuffle {
            spec.pool
                .choose_multiple(&mut self.rng, total)
                .cloned()
                .collect()
        } else {
            spec.pool.iter().take(total).cloned().collect()
        };

        Ok(picked
            .into_iter()
            .map(|question| {
                let mut order: Vec<usize> = (0..question.options.len()).collect();
                if spec.shuffle {
                    order.shuffle(&mut self.rng);
                }
                let correct = usize::from(question.correct_index);
                let correct_index = order
                    .iter()
                    .position(|original| *original == correct)
                    .and_then(|position| u8::try_from(position).ok())
                    .unwrap_or(question.correct_index);
                ServedQuestion {
                    text: question.text,
                    options: order
                        .iter()
                        .map(|original| question.options[*original].clone())
                        .collect(),
                    correct_index,
                }
            })
            .collect())
    }
}

fn present(
    session: &MemorySession,
    time_per_question: u32,
    clock: &Clock,
) -> Result<QuestionPresentation, SessionApiError> {
    let question = &session.questions[session.current_index];
    let elapsed = clock.seconds_since(session.question_started_at);
    let ordinal = u32::try_from(session.current_index + 1).unwrap_or(u32::MAX);
    let total = u32::try_from(session.questions.len()).unwrap_or(u32::MAX);
    let question = QuestionPresentation::new(
        ordinal,
        total,
        question.text.clone(),
        question.options.clone(),
        time_per_question.saturating_sub(elapsed),
    )
    .map_err(proctor_core::Error::from)?;
    Ok(question)
}

#[async_trait]
impl SessionApi for InMemorySessionApi {
    async fn validate(&self, link_id: &LinkId) -> Result<LinkInfo, SessionApiError> {
        let state = self.lock()?;
        let link = state.check_link(link_id)?;
        Ok(LinkInfo {
            link_id: link_id.clone(),
            test_name: link.spec.test_name.clone(),
            total_questions: link.spec.total_questions,
            time_per_question: link.spec.time_per_question,
        })
    }

    async fn start(
        &self,
        link_id: &LinkId,
        candidate: &Candidate,
    ) -> Result<SessionConfig, SessionApiError> {
        let mut state = self.lock()?;
        let spec = state.check_link(link_id)?.spec.clone();

        let existing = state.sessions.iter().find(|(_, session)| {
            session.link_id == *link_id && session.email.eq_ignore_ascii_case(candidate.email())
        });
        if let Some((session_id, session)) = existing {
            if session.completed {
                return Err(SessionApiError::from_detail(
                    400,
                    "You have already completed this test",
                ));
            }
            let total = u32::try_from(session.questions.len()).unwrap_or(u32::MAX);
            let config = SessionConfig::new(session_id.clone(), total, spec.time_per_question)
                .map_err(proctor_core::Error::from)?;
            return Ok(config);
        }

        let questions = state.serve_questions(&spec)?;
        let session_id = SessionId::new(format!("session-{}", state.next_session))
            .map_err(proctor_core::Error::from)?;
        state.next_session += 1;
        let now = state.clock.now();
        state.sessions.insert(
            session_id.clone(),
            MemorySession {
                link_id: link_id.clone(),
                email: candidate.email().to_string(),
                questions,
                current_index: 0,
                question_started_at: now,
                completed: false,
                attempts: Vec::new(),
                tab_switches: Vec::new(),
            },
        );
        if let Some(link) = state.links.get_mut(link_id) {
            link.uses += 1;
        }

        let config = SessionConfig::new(session_id, spec.total_questions, spec.time_per_question)
            .map_err(proctor_core::Error::from)?;
        Ok(config)
    }

    async fn get_question(
        &self,
        session_id: &SessionId,
    ) -> Result<QuestionPresentation, SessionApiError> {
        let mut state = self.lock()?;
        let clock = state.clock;
        let time_per_question = time_per_question_for(&state, session_id);
        let session = state.open_session(session_id)?;
        present(session, time_per_question, &clock)
    }

    async fn submit_answer(
        &self,
        session_id: &SessionId,
        selected: Option<OptionIndex>,
    ) -> Result<SubmitReceipt, SessionApiError> {
        let mut state = self.lock()?;
        state.submit_calls += 1;
        if state.failing_submits > 0 {
            state.failing_submits -= 1;
            return Err(SessionApiError::from_detail(503, "Service temporarily unavailable"));
        }

        let clock = state.clock;
        let now = clock.now();
        let time_per_question = time_per_question_for(&state, session_id);
        let session = state.open_session(session_id)?;

        let question = &session.questions[session.current_index];
        let elapsed = clock.seconds_since(session.question_started_at);
        let is_correct = selected.is_some_and(|index| index.value() == question.correct_index);
        session.attempts.push(RecordedAttempt {
            ordinal: u32::try_from(session.current_index + 1).unwrap_or(u32::MAX),
            selected,
            is_correct,
            auto_submitted: elapsed > time_per_question,
            time_taken: elapsed.min(time_per_question),
        });

        session.current_index += 1;
        if session.current_index >= session.questions.len() {
            session.completed = true;
            return Ok(SubmitReceipt::completed());
        }
        session.question_started_at = now;
        Ok(SubmitReceipt::next(present(session, time_per_question, &clock)?))
    }

    async fn log_tab_switch(&self, session_id: &SessionId) -> Result<bool, SessionApiError> {
        let mut state = self.lock()?;
        if state.failing_tab_switches {
            return Err(SessionApiError::from_detail(503, "Service temporarily unavailable"));
        }
        let now = state.clock.now();
        let Some(session) = state.sessions.get_mut(session_id) else {
            return Ok(false);
        };
        if session.completed {
            return Ok(false);
        }
        session
            .tab_switches
            .push(IntegrityEvent::focus_lost(session_id.clone(), now));
        Ok(true)
    }
}

fn time_per_question_for(state: &MemoryState, session_id: &SessionId) -> u32 {
    state
        .sessions
        .get(session_id)
        .and_then(|session| state.links.get(&session.link_id))
        .map_or(0, |link| link.spec.time_per_question)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proctor_core::time::fixed_clock;

    fn pool(count: usize) -> Vec<SeedQuestion> {
        (0..count)
            .map(|n| SeedQuestion::new(format!("Question {n}"), &["a", "b", "c", "d"], 1))
            .collect()
    }

    fn candidate() -> Candidate {
        Candidate::new("Ada Lovelace", "ada@example.com", "5551234567").unwrap()
    }

    fn link() -> LinkId {
        LinkId::new("quiz").unwrap()
    }

    #[tokio::test]
    async fn time_remaining_is_server_computed() {
        let api = InMemorySessionApi::new(fixed_clock());
        api.add_link(link(), LinkSpec::new("Quiz", 10, pool(3)));
        let config = api.start(&link(), &candidate()).await.unwrap();

        api.advance(Duration::seconds(4));
        let question = api.get_question(config.session_id()).await.unwrap();
        assert_eq!(question.ordinal(), 1);
        assert_eq!(question.time_remaining(), 6);

        api.advance(Duration::seconds(30));
        let question = api.get_question(config.session_id()).await.unwrap();
        assert_eq!(question.time_remaining(), 0);
    }

    #[tokio::test]
    async fn late_answers_are_flagged_auto_submitted() {
        let api = InMemorySessionApi::new(fixed_clock());
        api.add_link(link(), LinkSpec::new("Quiz", 10, pool(2)));
        let config = api.start(&link(), &candidate()).await.unwrap();
        let id = config.session_id();

        api.advance(Duration::seconds(3));
        let receipt = api
            .submit_answer(id, api.correct_option(id, 1))
            .await
            .unwrap();
        assert!(!receipt.test_completed);
        assert_eq!(receipt.next_question.unwrap().time_remaining(), 10);

        api.advance(Duration::seconds(11));
        let receipt = api.submit_answer(id, None).await.unwrap();
        assert!(receipt.test_completed);

        let attempts = api.attempts(id);
        assert_eq!(attempts.len(), 2);
        assert!(attempts[0].is_correct);
        assert!(!attempts[0].auto_submitted);
        assert_eq!(attempts[0].time_taken, 3);
        assert!(attempts[1].auto_submitted);
        assert_eq!(attempts[1].time_taken, 10);

        let err = api.submit_answer(id, None).await.unwrap_err();
        assert!(matches!(err, SessionApiError::AlreadyCompleted));
    }

    #[tokio::test]
    async fn links_enforce_uses_and_expiry() {
        let api = InMemorySessionApi::new(fixed_clock());
        api.add_link(link(), LinkSpec::new("Quiz", 10, pool(1)).with_max_uses(1));
        api.start(&link(), &candidate()).await.unwrap();
        let err = api.validate(&link()).await.unwrap_err();
        assert!(matches!(err, SessionApiError::Rejected { status: 400, .. }));

        let soon = LinkId::new("soon").unwrap();
        let expires_at = fixed_clock().now() + Duration::seconds(60);
        api.add_link(
            soon.clone(),
            LinkSpec::new("Quiz", 10, pool(1)).expiring_at(expires_at),
        );
        assert!(api.validate(&soon).await.is_ok());
        api.advance(Duration::seconds(61));
        let err = api.validate(&soon).await.unwrap_err();
        assert!(matches!(err, SessionApiError::Expired(_)));

        let err = api.validate(&LinkId::new("nope").unwrap()).await.unwrap_err();
        assert!(matches!(err, SessionApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn restarting_resumes_then_refuses_after_completion() {
        let api = InMemorySessionApi::new(fixed_clock());
        api.add_link(link(), LinkSpec::new("Quiz", 10, pool(1)));
        let first = api.start(&link(), &candidate()).await.unwrap();
        let again = api.start(&link(), &candidate()).await.unwrap();
        assert_eq!(first.session_id(), again.session_id());

        api.submit_answer(first.session_id(), None).await.unwrap();
        let err = api.start(&link(), &candidate()).await.unwrap_err();
        assert_eq!(err.message(), "You have already completed this test");
    }

    #[tokio::test]
    async fn shuffled_sessions_track_the_correct_option() {
        let api = InMemorySessionApi::with_seed(fixed_clock(), 42);
        api.add_link(
            link(),
            LinkSpec::new("Quiz", 10, pool(6))
                .with_total_questions(4)
                .shuffled(),
        );
        let config = api.start(&link(), &candidate()).await.unwrap();
        let id = config.session_id();
        for ordinal in 1..=4 {
            let correct = api.correct_option(id, ordinal).unwrap();
            let question = api.get_question(id).await.unwrap();
            assert_eq!(question.options()[usize::from(correct.value())], "b");
            api.submit_answer(id, Some(correct)).await.unwrap();
        }
        assert!(api.attempts(id).iter().all(|attempt| attempt.is_correct));
        assert!(api.is_completed(id));
    }

    #[tokio::test]
    async fn tab_switches_are_only_logged_for_open_sessions() {
        let api = InMemorySessionApi::new(fixed_clock());
        api.add_link(link(), LinkSpec::new("Quiz", 10, pool(1)));
        let config = api.start(&link(), &candidate()).await.unwrap();
        let id = config.session_id();

        assert!(api.log_tab_switch(id).await.unwrap());
        api.submit_answer(id, None).await.unwrap();
        assert!(!api.log_tab_switch(id).await.unwrap());
        assert_eq!(api.tab_switches(id).len(), 1);

        api.fail_tab_switches(true);
        assert!(api.log_tab_switch(id).await.is_err());
    }
}
