use std::sync::Arc;

use proctor_core::model::LinkId;
use services::{
    Clock, IntegrityReporter, RegistrationService, SessionApi, SessionController,
};
use storage::repository::RecoveryStore;

pub trait UiApp: Send + Sync {
    /// Link to open on launch, if one was passed in.
    fn initial_link(&self) -> Option<LinkId>;

    fn session_api(&self) -> Arc<dyn SessionApi>;
    fn recovery(&self) -> Arc<dyn RecoveryStore>;
    fn clock(&self) -> Clock;
}

#[derive(Clone)]
pub struct AppContext {
    initial_link: Option<LinkId>,
    api: Arc<dyn SessionApi>,
    recovery: Arc<dyn RecoveryStore>,
    clock: Clock,
}

impl AppContext {
    #[must_use]
    pub fn new(app: &Arc<dyn UiApp>) -> Self {
        Self {
            initial_link: app.initial_link(),
            api: app.session_api(),
            recovery: app.recovery(),
            clock: app.clock(),
        }
    }

    #[must_use]
    pub fn initial_link(&self) -> Option<LinkId> {
        self.initial_link.clone()
    }

    #[must_use]
    pub fn registration(&self) -> RegistrationService {
        RegistrationService::new(Arc::clone(&self.api), Arc::clone(&self.recovery))
    }

    /// A fresh controller for one visit to the test view.
    #[must_use]
    pub fn session_controller(&self) -> SessionController {
        SessionController::new(Arc::clone(&self.api), Arc::clone(&self.recovery))
    }

    #[must_use]
    pub fn reporter(&self) -> IntegrityReporter {
        IntegrityReporter::new(Arc::clone(&self.api), self.clock)
    }
}

// This context is provided by the application composition root (e.g. `crates/app`).

/// Build an `AppContext` from a UI-facing app implementation.
#[must_use]
pub fn build_app_context(app: &Arc<dyn UiApp>) -> AppContext {
    AppContext::new(app)
}
