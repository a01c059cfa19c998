use dioxus::prelude::*;
use dioxus_router::{Link, use_navigator};
use tracing::debug;

use services::{SessionPhase, SessionRunner, SessionSnapshot};

use crate::context::AppContext;
use crate::routes::Route;
use crate::vm::{TestScreenVm, map_test_screen};
use super::integrity::IntegrityGuard;

#[component]
pub fn TestView(link_id: String) -> Element {
    let ctx = use_context::<AppContext>();
    let navigator = use_navigator();
    let snapshot = use_signal(SessionSnapshot::idle);

    let handle = use_hook(|| {
        let (runner, handle) = SessionRunner::new(ctx.session_controller());
        spawn(async move {
            let controller = runner.run().await;
            debug!(
                phase = ?controller.phase(),
                dispatched = controller.dispatched().len(),
                "session runner stopped"
            );
        });

        let mut updates = handle.snapshots();
        let mut snapshot = snapshot;
        spawn(async move {
            loop {
                let next = updates.borrow_and_update().clone();
                snapshot.set(next);
                if updates.changed().await.is_err() {
                    break;
                }
            }
        });
        handle
    });

    let active_session = {
        let registration = ctx.registration();
        use_resource(move || {
            let registration = registration.clone();
            async move { registration.active_session().await }
        })
    };

    {
        let link_id = link_id.clone();
        use_effect(move || match snapshot.read().phase {
            SessionPhase::Completed => {
                navigator.replace(Route::Complete {
                    link_id: link_id.clone(),
                });
            }
            SessionPhase::RedirectToLanding => {
                navigator.replace(Route::Landing {
                    link_id: link_id.clone(),
                });
            }
            _ => {}
        });
    }

    let on_select = {
        let handle = handle.clone();
        move |(ordinal, index): (u32, usize)| handle.select(ordinal, Some(index))
    };
    let on_submit = move |ordinal: u32| handle.submit(ordinal);

    let current = snapshot.read().clone();
    let screen = map_test_screen(&current);
    let session_id = active_session
        .value()
        .read()
        .as_ref()
        .and_then(|session| session.as_ref().map(|id| id.as_str().to_string()));
    let guard_key = session_id.clone().unwrap_or_else(|| "none".to_string());

    rsx! {
        div { id: "test-root", class: "page page-test",
            IntegrityGuard { key: "{guard_key}", session_id }
            match (current.phase, screen) {
                (SessionPhase::Errored, _) => rsx! {
                    div { class: "card card-error",
                        h2 { "Error" }
                        p { "{current.error.clone().unwrap_or_default()}" }
                        Link { to: Route::Landing { link_id: link_id.clone() }, "Back to the test page" }
                    }
                },
                (_, Some(screen)) => rsx! {
                    QuestionScreen { screen, on_select, on_submit }
                },
                _ => rsx! {
                    p { class: "muted", "Loading..." }
                },
            }
        }
    }
}

#[component]
fn QuestionScreen(
    screen: TestScreenVm,
    on_select: EventHandler<(u32, usize)>,
    on_submit: EventHandler<u32>,
) -> Element {
    let ordinal = screen.ordinal;
    let disabled = !screen.can_submit;

    rsx! {
        header { class: "test-header",
            div { class: "test-header-row",
                div { class: "question-count",
                    span { class: "muted", "Question" }
                    strong { " {screen.header}" }
                }
                div { class: "total-clock", "Total {screen.total_clock}" }
                div { class: "question-timer {screen.urgency.class()}", "{screen.seconds_label}" }
            }
            div { class: "timer-track",
                div {
                    class: "timer-bar {screen.bar_tone.class()}",
                    style: "width: {screen.bar_percent}%",
                }
            }
        }
        section { class: "question card",
            h2 { class: "question-text", "{screen.text}" }
            div { class: "options",
                for option in screen.options.iter().cloned() {
                    button {
                        key: "{option.index}",
                        class: if option.selected { "option option-selected" } else { "option" },
                        r#type: "button",
                        disabled,
                        onclick: move |_| on_select.call((ordinal, option.index)),
                        span { class: "option-label", "{option.label}" }
                        span { class: "option-text", "{option.text}" }
                    }
                }
            }
            div { class: "submit-row",
                button {
                    id: "test-submit",
                    class: "btn btn-primary",
                    r#type: "button",
                    disabled,
                    onclick: move |_| on_submit.call(ordinal),
                    "{screen.submit_label}"
                }
            }
        }
        footer { class: "progress-dots",
            for (n, dot) in screen.dots.iter().enumerate() {
                span { key: "{n}", class: dot.class() }
            }
            if let Some(more) = screen.more_label.as_ref() {
                span { class: "muted dots-more", "{more}" }
            }
        }
    }
}
