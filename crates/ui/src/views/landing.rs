use dioxus::prelude::*;
use dioxus_router::use_navigator;
use tracing::debug;

use proctor_core::model::LinkId;

use crate::context::AppContext;
use crate::routes::Route;
use crate::views::{ViewError, ViewState, view_state_from_resource};
use crate::vm::{LandingVm, RegistrationForm, TEST_RULES};

const LINK_NOT_FOUND: &str = "Test link not found";

#[component]
pub fn LandingView(link_id: String) -> Element {
    let ctx = use_context::<AppContext>();
    let navigator = use_navigator();
    let registration = ctx.registration();

    let mut show_form = use_signal(|| false);
    let mut form = use_signal(RegistrationForm::default);
    let mut form_error = use_signal(|| None::<String>);
    let mut starting = use_signal(|| false);

    let resource = {
        let registration = registration.clone();
        let link_id = link_id.clone();
        use_resource(move || {
            let registration = registration.clone();
            let link_id = link_id.clone();
            async move {
                let link_id = LinkId::new(link_id)
                    .map_err(|_| ViewError::Service(LINK_NOT_FOUND.to_string()))?;
                let info = registration
                    .describe(&link_id)
                    .await
                    .map_err(|err| ViewError::Service(err.message()))?;
                Ok::<_, ViewError>(LandingVm::from(&info))
            }
        })
    };
    let state = view_state_from_resource(&resource);
    let showing_form = show_form();

    let start_test = {
        let link_id = link_id.clone();
        use_callback(move |()| {
            if starting() {
                return;
            }
            let input = form();
            if input.is_blank() {
                form_error.set(Some("Please fill in all fields".to_string()));
                return;
            }
            let Ok(link) = LinkId::new(link_id.clone()) else {
                form_error.set(Some(LINK_NOT_FOUND.to_string()));
                return;
            };
            let registration = registration.clone();
            let mut starting = starting;
            let mut form_error = form_error;
            spawn(async move {
                starting.set(true);
                form_error.set(None);
                match registration
                    .register(&link, &input.name, &input.email, &input.phone)
                    .await
                {
                    Ok(config) => {
                        debug!(session_id = %config.session_id(), "registration accepted");
                        navigator.push(Route::Take {
                            link_id: link.as_str().to_string(),
                        });
                    }
                    Err(err) => form_error.set(Some(err.message())),
                }
                starting.set(false);
            });
        })
    };

    rsx! {
        div { class: "page page-centered",
            match (state, showing_form) {
                (ViewState::Idle | ViewState::Loading, _) => rsx! {
                    p { class: "muted", "Loading..." }
                },
                (ViewState::Error(err), _) => rsx! {
                    div { class: "card card-error",
                        h2 { "Link Not Valid" }
                        p { "{err.message()}" }
                    }
                },
                (ViewState::Ready(info), false) => rsx! {
                    div { class: "card",
                        h1 { "{info.test_name}" }
                        p { class: "muted", "Online Assessment" }
                        div { class: "facts",
                            div { class: "fact",
                                span { class: "fact-badge", "{info.total_questions}" }
                                div {
                                    h3 { "Total Questions" }
                                    p { class: "muted", "Multiple choice questions" }
                                }
                            }
                            div { class: "fact",
                                span { class: "fact-badge", "⏱" }
                                div {
                                    h3 { "{info.per_question_label}" }
                                    p { class: "muted", "Auto-submits when time runs out" }
                                }
                            }
                        }
                        div { class: "rules",
                            h3 { "Important Rules" }
                            ul {
                                for rule in TEST_RULES {
                                    li { "{rule}" }
                                }
                            }
                        }
                        button {
                            id: "landing-continue",
                            class: "btn btn-primary btn-wide",
                            r#type: "button",
                            onclick: move |_| show_form.set(true),
                            "Continue to Registration"
                        }
                    }
                },
                (ViewState::Ready(_), true) => rsx! {
                    div { class: "card",
                        h2 { "Enter Your Details" }
                        if let Some(message) = form_error() {
                            div { class: "alert alert-danger", "{message}" }
                        }
                        label { r#for: "reg-name", "Full Name" }
                        input {
                            id: "reg-name",
                            r#type: "text",
                            placeholder: "Enter your full name",
                            value: "{form.read().name}",
                            oninput: move |evt| form.write().name = evt.value(),
                        }
                        label { r#for: "reg-email", "Email Address" }
                        input {
                            id: "reg-email",
                            r#type: "email",
                            placeholder: "Enter your email",
                            value: "{form.read().email}",
                            oninput: move |evt| form.write().email = evt.value(),
                        }
                        label { r#for: "reg-phone", "Phone Number" }
                        input {
                            id: "reg-phone",
                            r#type: "tel",
                            placeholder: "Enter your phone number",
                            value: "{form.read().phone}",
                            oninput: move |evt| form.write().phone = evt.value(),
                        }
                        div { class: "form-actions",
                            button {
                                class: "btn btn-secondary",
                                r#type: "button",
                                onclick: move |_| show_form.set(false),
                                "Back"
                            }
                            button {
                                id: "reg-start",
                                class: "btn btn-primary",
                                r#type: "button",
                                disabled: starting(),
                                onclick: move |_| start_test.call(()),
                                if starting() { "Starting..." } else { "Start Test" }
                            }
                        }
                    }
                },
            }
        }
    }
}
