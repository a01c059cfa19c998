//! Focus-loss detection and the small set of deterrents around it.
//!
//! A [`MonitorLease`] is the only way listeners get attached: acquiring one
//! installs them under a unique [`MonitorKey`], releasing (or dropping) it
//! removes exactly those listeners again.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use proctor_core::Clock;
use proctor_core::model::{IntegrityEvent, SessionId};

use crate::api::SessionApi;

static NEXT_LEASE: AtomicU64 = AtomicU64::new(1);

/// A key combination the host intercepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Shortcut {
    pub key: &'static str,
    pub ctrl: bool,
    pub shift: bool,
}

/// Inspection shortcuts whose default action is suppressed.
pub const SUPPRESSED_SHORTCUTS: [Shortcut; 3] = [
    Shortcut {
        key: "F12",
        ctrl: false,
        shift: false,
    },
    Shortcut {
        key: "I",
        ctrl: true,
        shift: true,
    },
    Shortcut {
        key: "u",
        ctrl: true,
        shift: false,
    },
];

impl Shortcut {
    #[must_use]
    pub fn matches(&self, key: &str, ctrl: bool, shift: bool) -> bool {
        self.key == key && (!self.ctrl || ctrl) && (!self.shift || shift)
    }
}

#[must_use]
pub fn is_suppressed(key: &str, ctrl: bool, shift: bool) -> bool {
    SUPPRESSED_SHORTCUTS
        .iter()
        .any(|shortcut| shortcut.matches(key, ctrl, shift))
}

/// Something the host environment observed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EnvironmentSignal {
    Visibility {
        hidden: bool,
    },
    PopState,
    ContextMenu,
    KeyDown {
        key: String,
        #[serde(default)]
        ctrl: bool,
        #[serde(default)]
        shift: bool,
    },
}

/// What the host should do about a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorResponse {
    Ignore,
    PreventDefault,
    /// Re-push the current history entry so back-navigation stays on the page.
    RestoreHistory,
    /// Focus was lost while a session is active.
    Violation,
}

/// Identifies one installation of listeners.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MonitorKey(String);

impl MonitorKey {
    fn next(session: Option<&SessionId>) -> Self {
        let n = NEXT_LEASE.fetch_add(1, Ordering::Relaxed);
        let scope = session.map_or("none", SessionId::as_str);
        Self(format!("proctor-monitor-{scope}-{n}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Attaches and detaches environment listeners.
pub trait MonitorHost: Send + Sync {
    /// Attach every listener under `key` and push an initial history entry.
    fn install(&self, key: &MonitorKey);

    /// Detach the listeners installed under `key`. Unknown keys are ignored.
    fn uninstall(&self, key: &MonitorKey);
}

pub type ViolationCallback = Box<dyn FnMut(&SessionId) + Send>;

/// Listeners held on behalf of one session (or of none).
pub struct MonitorLease {
    host: Arc<dyn MonitorHost>,
    key: Option<MonitorKey>,
    session: Option<SessionId>,
    hidden: bool,
    on_violation: ViolationCallback,
}

impl MonitorLease {
    /// Installs listeners for `session`. Without a session nothing is ever reported.
    pub fn acquire(
        host: Arc<dyn MonitorHost>,
        session: Option<SessionId>,
        on_violation: impl FnMut(&SessionId) + Send + 'static,
    ) -> Self {
        let key = MonitorKey::next(session.as_ref());
        host.install(&key);
        debug!(key = key.as_str(), "integrity monitor installed");
        Self {
            host,
            key: Some(key),
            session,
            hidden: false,
            on_violation: Box::new(on_violation),
        }
    }

    #[must_use]
    pub fn key(&self) -> Option<&MonitorKey> {
        self.key.as_ref()
    }

    #[must_use]
    pub fn session(&self) -> Option<&SessionId> {
        self.session.as_ref()
    }

    /// Swaps listeners over to a new session, removing the old ones first.
    pub fn rebind(&mut self, session: Option<SessionId>) {
        if self.key.is_some() && self.session == session {
            return;
        }
        self.release();
        let key = MonitorKey::next(session.as_ref());
        self.host.install(&key);
        self.key = Some(key);
        self.session = session;
        self.hidden = false;
    }

    /// Removes this lease's listeners. Safe to call more than once.
    pub fn release(&mut self) {
        if let Some(key) = self.key.take() {
            self.host.uninstall(&key);
            debug!(key = key.as_str(), "integrity monitor removed");
        }
    }

    /// Decides the response to one signal, reporting a violation on each
    /// transition to hidden.
    pub fn handle(&mut self, signal: &EnvironmentSignal) -> MonitorResponse {
        if self.key.is_none() {
            return MonitorResponse::Ignore;
        }
        match signal {
            EnvironmentSignal::Visibility { hidden: true } => {
                if self.hidden {
                    return MonitorResponse::Ignore;
                }
                self.hidden = true;
                match &self.session {
                    Some(session) => {
                        info!(session_id = %session, "focus lost during session");
                        (self.on_violation)(session);
                        MonitorResponse::Violation
                    }
                    None => MonitorResponse::Ignore,
                }
            }
            EnvironmentSignal::Visibility { hidden: false } => {
                self.hidden = false;
                MonitorResponse::Ignore
            }
            EnvironmentSignal::PopState => MonitorResponse::RestoreHistory,
            EnvironmentSignal::ContextMenu => MonitorResponse::PreventDefault,
            EnvironmentSignal::KeyDown { key, ctrl, shift } => {
                if is_suppressed(key, *ctrl, *shift) {
                    MonitorResponse::PreventDefault
                } else {
                    MonitorResponse::Ignore
                }
            }
        }
    }
}

impl Drop for MonitorLease {
    fn drop(&mut self) {
        self.release();
    }
}

/// Delivers focus-lost events to the service without blocking the caller.
#[derive(Clone)]
pub struct IntegrityReporter {
    api: Arc<dyn SessionApi>,
    clock: Clock,
}

impl IntegrityReporter {
    #[must_use]
    pub fn new(api: Arc<dyn SessionApi>, clock: Clock) -> Self {
        Self { api, clock }
    }

    /// Fire-and-forget delivery on the current Tokio runtime.
    pub fn report(&self, session_id: SessionId) {
        let event = IntegrityEvent::focus_lost(session_id, self.clock.now());
        let reporter = self.clone();
        tokio::spawn(async move {
            reporter.deliver(event).await;
        });
    }

    /// Sends one event. Failures are logged and swallowed.
    pub async fn deliver(&self, event: IntegrityEvent) -> bool {
        match self.api.log_tab_switch(&event.session_id).await {
            Ok(logged) => {
                debug!(
                    session_id = %event.session_id,
                    occurred_at = %event.occurred_at,
                    logged,
                    "tab switch reported"
                );
                logged
            }
            Err(err) => {
                warn!(session_id = %event.session_id, error = %err, "failed to log tab switch");
                false
            }
        }
    }
}
