mod controller;
mod guard;
mod integrity;
mod registration;
mod runner;

// Public API of the session subsystem.
pub use controller::{DEFAULT_TIME_PER_QUESTION, SessionController, SessionPhase, SessionSnapshot};
pub use guard::SubmissionGuard;
pub use integrity::{
    EnvironmentSignal, IntegrityReporter, MonitorHost, MonitorKey, MonitorLease, MonitorResponse,
    SUPPRESSED_SHORTCUTS, Shortcut, ViolationCallback, is_suppressed,
};
pub use registration::RegistrationService;
pub use runner::{SessionCommand, SessionHandle, SessionRunner, TICK};
