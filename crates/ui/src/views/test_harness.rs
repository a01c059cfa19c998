use std::sync::Arc;

use dioxus::core::NoOpMutations;
use dioxus::prelude::*;
use dioxus_router::{Routable, Router};
use proctor_core::model::{LinkId, TabScope};
use proctor_core::time::fixed_now;
use services::api::{LinkSpec, SeedQuestion};
use services::{Clock, InMemorySessionApi, RegistrationService, SessionApi};
use storage::repository::{InMemoryRecoveryStore, RecoveryStore};

use crate::context::{UiApp, build_app_context};
use crate::views::{CompleteView, HomeView, LandingView, TestView};

pub const LINK: &str = "quiz";

#[derive(Clone)]
struct TestApp {
    api: InMemorySessionApi,
    recovery: InMemoryRecoveryStore,
}

impl UiApp for TestApp {
    fn initial_link(&self) -> Option<LinkId> {
        None
    }

    fn session_api(&self) -> Arc<dyn SessionApi> {
        Arc::new(self.api.clone())
    }

    fn recovery(&self) -> Arc<dyn RecoveryStore> {
        Arc::new(self.recovery.clone())
    }

    fn clock(&self) -> Clock {
        Clock::fixed(fixed_now())
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Home,
    Landing(&'static str),
    Take(&'static str),
    Complete(&'static str),
}

#[derive(Props, Clone)]
struct ViewHarnessProps {
    app: Arc<TestApp>,
    view: ViewKind,
}

impl PartialEq for ViewHarnessProps {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Eq for ViewHarnessProps {}

#[component]
fn ViewRouterHarness(props: ViewHarnessProps) -> Element {
    let app: Arc<dyn UiApp> = props.app.clone();
    use_context_provider(|| build_app_context(&app));
    use_context_provider(|| props.view);
    rsx! { Router::<TestRoute> {} }
}

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum TestRoute {
    #[route("/")]
    Root {},
}

#[component]
fn Root() -> Element {
    let view = use_context::<ViewKind>();
    match view {
        ViewKind::Home => rsx! { HomeView {} },
        ViewKind::Landing(link) => rsx! { LandingView { link_id: link.to_string() } },
        ViewKind::Take(link) => rsx! { TestView { link_id: link.to_string() } },
        ViewKind::Complete(link) => rsx! { CompleteView { link_id: link.to_string() } },
    }
}

pub struct ViewHarness {
    pub dom: VirtualDom,
    pub api: InMemorySessionApi,
    pub recovery: InMemoryRecoveryStore,
}

impl ViewHarness {
    pub fn rebuild(&mut self) {
        self.dom.rebuild_in_place();
        drive_dom(&mut self.dom);
    }

    pub async fn drive_async(&mut self) {
        let _ = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            self.dom.wait_for_work(),
        )
        .await;
        self.dom.render_immediate(&mut NoOpMutations);
        self.dom.process_events();
    }

    pub async fn settle(&mut self) {
        for _ in 0..4 {
            self.drive_async().await;
        }
    }

    pub fn registration(&self) -> RegistrationService {
        RegistrationService::new(Arc::new(self.api.clone()), Arc::new(self.recovery.clone()))
    }

    pub fn render(&self) -> String {
        dioxus_ssr::render(&self.dom)
    }
}

pub fn drive_dom(dom: &mut VirtualDom) {
    dom.process_events();
    dom.render_immediate(&mut NoOpMutations);
    dom.process_events();
}

/// A harness over a two-question link named [`LINK`] with ten seconds per question.
pub fn setup_view_harness(view: ViewKind) -> ViewHarness {
    let api = InMemorySessionApi::new(Clock::fixed(fixed_now()));
    if let Ok(link_id) = LinkId::new(LINK) {
        api.add_link(
            link_id,
            LinkSpec::new(
                "Quiz",
                10,
                vec![
                    SeedQuestion::new("Which planet is largest?", &["Mars", "Jupiter"], 1),
                    SeedQuestion::new("Which number is prime?", &["4", "6", "7"], 2),
                ],
            ),
        );
    }
    let recovery = InMemoryRecoveryStore::new(TabScope::generate());

    let app = Arc::new(TestApp {
        api: api.clone(),
        recovery: recovery.clone(),
    });
    let dom = VirtualDom::new_with_props(ViewRouterHarness, ViewHarnessProps { app, view });

    ViewHarness { dom, api, recovery }
}
