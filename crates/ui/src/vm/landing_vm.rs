use proctor_core::model::LinkInfo;

/// Shown on the instructions screen before registration.
pub const TEST_RULES: [&str; 5] = [
    "One question at a time",
    "You cannot go back to previous questions",
    "Timer auto-submits your answer",
    "Do not refresh or switch tabs",
    "Test will be monitored for suspicious activity",
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LandingVm {
    pub test_name: String,
    pub total_questions: u32,
    pub per_question_label: String,
}

impl From<&LinkInfo> for LandingVm {
    fn from(info: &LinkInfo) -> Self {
        Self {
            test_name: info.test_name.clone(),
            total_questions: info.total_questions,
            per_question_label: format!("{} Seconds Per Question", info.time_per_question),
        }
    }
}

/// Raw registration form input.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl RegistrationForm {
    #[must_use]
    pub fn is_blank(&self) -> bool {
        [&self.name, &self.email, &self.phone]
            .iter()
            .any(|field| field.trim().is_empty())
    }
}
