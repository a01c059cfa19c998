#![forbid(unsafe_code)]

pub mod api;
pub mod config;
pub mod error;
pub mod sessions;

pub use proctor_core::Clock;
pub use sessions as session;

pub use api::{HttpSessionApi, InMemorySessionApi, SessionApi, SubmitReceipt};
pub use config::ServiceConfig;
pub use error::{ConfigError, RegistrationError, SessionApiError};

pub use sessions::{
    IntegrityReporter, MonitorHost, MonitorLease, RegistrationService, SessionController,
    SessionHandle, SessionPhase, SessionRunner, SessionSnapshot,
};
