use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use dioxus::document::eval;
use dioxus::prelude::*;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use proctor_core::model::SessionId;
use services::session::{EnvironmentSignal, MonitorHost, MonitorKey, MonitorLease, MonitorResponse};

use crate::context::AppContext;
use super::scripts::{install_monitor_script, uninstall_monitor_script};

type SignalSender = mpsc::UnboundedSender<(MonitorKey, EnvironmentSignal)>;

/// Runs the monitor scripts in the webview and forwards their signals, tagged
/// with the key they were installed under.
struct WebviewMonitorHost {
    signals: SignalSender,
}

impl MonitorHost for WebviewMonitorHost {
    fn install(&self, key: &MonitorKey) {
        let mut script = eval(&install_monitor_script(key.as_str()));
        let signals = self.signals.clone();
        let key = key.clone();
        spawn(async move {
            while let Ok(signal) = script.recv::<EnvironmentSignal>().await {
                if signals.send((key.clone(), signal)).is_err() {
                    break;
                }
            }
            trace!(key = key.as_str(), "monitor script channel closed");
        });
    }

    fn uninstall(&self, key: &MonitorKey) {
        let _ = eval(&uninstall_monitor_script(key.as_str()));
    }
}

/// Holds the focus monitor for as long as it is mounted.
///
/// Key it by session so a session change remounts it and swaps the listeners.
#[component]
pub(super) fn IntegrityGuard(session_id: Option<String>) -> Element {
    let ctx = use_context::<AppContext>();

    let lease = use_hook(move || {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let host: Arc<dyn MonitorHost> = Arc::new(WebviewMonitorHost { signals: tx });
        let session = session_id.and_then(|raw| SessionId::new(raw).ok());
        let reporter = ctx.reporter();
        let lease = Rc::new(RefCell::new(MonitorLease::acquire(
            host,
            session,
            move |id: &SessionId| reporter.report(id.clone()),
        )));

        let listening = Rc::clone(&lease);
        spawn(async move {
            while let Some((key, signal)) = rx.recv().await {
                let mut lease = listening.borrow_mut();
                if lease.key() != Some(&key) {
                    continue;
                }
                let response = lease.handle(&signal);
                if response != MonitorResponse::Ignore {
                    debug!(?signal, ?response, "environment signal handled");
                }
            }
        });
        lease
    });

    use_drop(move || lease.borrow_mut().release());

    rsx! {}
}
