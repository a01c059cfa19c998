use proctor_core::model::{OptionIndex, QuestionPresentation};
use services::{SessionPhase, SessionSnapshot};

use crate::vm::time_fmt::{format_clock, format_seconds};

/// The progress strip never shows more dots than this.
pub const MAX_PROGRESS_DOTS: u32 = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Urgency {
    Normal,
    Warning,
    Critical,
}

impl Urgency {
    #[must_use]
    pub fn from_remaining(seconds: u32) -> Self {
        match seconds {
            0..=3 => Self::Critical,
            4..=5 => Self::Warning,
            _ => Self::Normal,
        }
    }

    #[must_use]
    pub fn class(self) -> &'static str {
        match self {
            Self::Normal => "timer-normal",
            Self::Warning => "timer-warning",
            Self::Critical => "timer-critical",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BarTone {
    Ok,
    Warning,
    Danger,
}

impl BarTone {
    #[must_use]
    pub fn from_percent(percent: f64) -> Self {
        if percent <= 30.0 {
            Self::Danger
        } else if percent <= 50.0 {
            Self::Warning
        } else {
            Self::Ok
        }
    }

    #[must_use]
    pub fn class(self) -> &'static str {
        match self {
            Self::Ok => "bar-ok",
            Self::Warning => "bar-warning",
            Self::Danger => "bar-danger",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DotState {
    Answered,
    Current,
    Upcoming,
}

impl DotState {
    #[must_use]
    pub fn class(self) -> &'static str {
        match self {
            Self::Answered => "dot dot-answered",
            Self::Current => "dot dot-current",
            Self::Upcoming => "dot dot-upcoming",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptionVm {
    pub index: usize,
    pub label: char,
    pub text: String,
    pub selected: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TestScreenVm {
    pub ordinal: u32,
    pub header: String,
    pub text: String,
    pub options: Vec<OptionVm>,
    pub seconds_label: String,
    pub urgency: Urgency,
    pub bar_percent: f64,
    pub bar_tone: BarTone,
    pub total_clock: String,
    pub submit_label: &'static str,
    pub can_submit: bool,
    pub dots: Vec<DotState>,
    pub more_label: Option<String>,
}

/// Maps a snapshot to what the test view draws. `None` until a question is on screen.
#[must_use]
pub fn map_test_screen(snapshot: &SessionSnapshot) -> Option<TestScreenVm> {
    if !matches!(
        snapshot.phase,
        SessionPhase::AnsweringQuestion | SessionPhase::Submitting
    ) {
        return None;
    }
    let question = snapshot.question.as_ref()?;
    let remaining = snapshot.question_remaining;
    let can_submit = snapshot.can_submit();
    let submit_label = if !can_submit {
        "Submitting..."
    } else if question.is_last() {
        "Submit & Finish"
    } else {
        "Submit & Next"
    };
    let (dots, more_label) = progress_dots(question);

    Some(TestScreenVm {
        ordinal: question.ordinal(),
        header: format!("{} / {}", question.ordinal(), question.total_questions()),
        text: question.text().to_string(),
        options: map_options(question, snapshot.selected),
        seconds_label: format_seconds(remaining),
        urgency: Urgency::from_remaining(remaining),
        bar_percent: snapshot.question_percent,
        bar_tone: BarTone::from_percent(snapshot.question_percent),
        total_clock: format_clock(snapshot.total_remaining),
        submit_label,
        can_submit,
        dots,
        more_label,
    })
}

fn map_options(question: &QuestionPresentation, selected: Option<OptionIndex>) -> Vec<OptionVm> {
    question
        .options()
        .iter()
        .enumerate()
        .map(|(index, text)| {
            let label = u8::try_from(index)
                .ok()
                .and_then(|offset| b'A'.checked_add(offset))
                .map_or('?', char::from);
            OptionVm {
                index,
                label,
                text: text.clone(),
                selected: selected.is_some_and(|chosen| usize::from(chosen.value()) == index),
            }
        })
        .collect()
}

fn progress_dots(question: &QuestionPresentation) -> (Vec<DotState>, Option<String>) {
    let total = question.total_questions();
    let current = question.ordinal();
    let dots = (1..=total.min(MAX_PROGRESS_DOTS))
        .map(|n| match n.cmp(&current) {
            std::cmp::Ordering::Less => DotState::Answered,
            std::cmp::Ordering::Equal => DotState::Current,
            std::cmp::Ordering::Greater => DotState::Upcoming,
        })
        .collect();
    let more = (total > MAX_PROGRESS_DOTS).then(|| format!("+{} more", total - MAX_PROGRESS_DOTS));
    (dots, more)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(ordinal: u32, total: u32) -> QuestionPresentation {
        QuestionPresentation::new(
            ordinal,
            total,
            "Pick one",
            vec!["first".into(), "second".into(), "third".into()],
            10,
        )
        .unwrap()
    }

    fn answering(question: QuestionPresentation, remaining: u32) -> SessionSnapshot {
        SessionSnapshot {
            phase: SessionPhase::AnsweringQuestion,
            question: Some(question),
            selected: None,
            question_remaining: remaining,
            question_percent: f64::from(remaining) * 10.0,
            total_remaining: 75,
            total_allotment: 100,
            error: None,
        }
    }

    #[test]
    fn nothing_to_draw_without_a_question() {
        assert!(map_test_screen(&SessionSnapshot::idle()).is_none());
        let mut snapshot = answering(question(1, 3), 10);
        snapshot.phase = SessionPhase::Completed;
        assert!(map_test_screen(&snapshot).is_none());
    }

    #[test]
    fn header_clock_and_labels() {
        let mut snapshot = answering(question(2, 3), 10);
        snapshot.selected = Some(
            snapshot
                .question
                .as_ref()
                .unwrap()
                .option_index(1)
                .unwrap(),
        );
        let vm = map_test_screen(&snapshot).unwrap();
        assert_eq!(vm.header, "2 / 3");
        assert_eq!(vm.seconds_label, "10s");
        assert_eq!(vm.total_clock, "1:15");
        assert_eq!(vm.submit_label, "Submit & Next");
        let labels: Vec<char> = vm.options.iter().map(|option| option.label).collect();
        assert_eq!(labels, vec!['A', 'B', 'C']);
        assert!(vm.options[1].selected);
        assert!(!vm.options[0].selected);
    }

    #[test]
    fn last_question_finishes() {
        let vm = map_test_screen(&answering(question(3, 3), 8)).unwrap();
        assert_eq!(vm.submit_label, "Submit & Finish");
    }

    #[test]
    fn submit_is_disabled_while_in_flight() {
        let mut snapshot = answering(question(1, 3), 8);
        snapshot.phase = SessionPhase::Submitting;
        let vm = map_test_screen(&snapshot).unwrap();
        assert!(!vm.can_submit);
        assert_eq!(vm.submit_label, "Submitting...");
    }

    #[test]
    fn urgency_thresholds() {
        assert_eq!(Urgency::from_remaining(0), Urgency::Critical);
        assert_eq!(Urgency::from_remaining(3), Urgency::Critical);
        assert_eq!(Urgency::from_remaining(4), Urgency::Warning);
        assert_eq!(Urgency::from_remaining(5), Urgency::Warning);
        assert_eq!(Urgency::from_remaining(6), Urgency::Normal);
    }

    #[test]
    fn bar_tone_thresholds() {
        assert_eq!(BarTone::from_percent(30.0), BarTone::Danger);
        assert_eq!(BarTone::from_percent(30.5), BarTone::Warning);
        assert_eq!(BarTone::from_percent(50.0), BarTone::Warning);
        assert_eq!(BarTone::from_percent(51.0), BarTone::Ok);
    }

    #[test]
    fn dots_cap_at_twenty() {
        let vm = map_test_screen(&answering(question(2, 3), 10)).unwrap();
        assert_eq!(
            vm.dots,
            vec![DotState::Answered, DotState::Current, DotState::Upcoming]
        );
        assert_eq!(vm.more_label, None);

        let vm = map_test_screen(&answering(question(21, 25), 10)).unwrap();
        assert_eq!(vm.dots.len(), 20);
        assert!(vm.dots.iter().all(|dot| *dot == DotState::Answered));
        assert_eq!(vm.more_label.as_deref(), Some("+5 more"));
    }
}
