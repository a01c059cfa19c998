use dioxus::prelude::*;
use dioxus_router::use_navigator;

use proctor_core::model::LinkId;

use crate::context::AppContext;
use crate::routes::Route;

#[component]
pub fn HomeView() -> Element {
    let ctx = use_context::<AppContext>();
    let navigator = use_navigator();
    let initial_link = ctx.initial_link();
    let mut raw_link = use_signal(String::new);
    let mut error = use_signal(|| None::<&'static str>);

    use_effect(move || {
        if let Some(link) = initial_link.as_ref() {
            navigator.replace(Route::Landing {
                link_id: link.as_str().to_string(),
            });
        }
    });

    let mut open_link = move || match LinkId::from_link_or_id(&raw_link.read()) {
        Ok(link) => {
            error.set(None);
            navigator.push(Route::Landing {
                link_id: link.as_str().to_string(),
            });
        }
        Err(_) => error.set(Some("Enter a valid test link")),
    };

    rsx! {
        div { class: "page page-centered",
            div { class: "card",
                h1 { "Online Assessment" }
                p { class: "muted", "Paste the test link you were sent to begin." }
                if let Some(message) = error() {
                    div { class: "alert alert-danger", "{message}" }
                }
                input {
                    id: "home-link",
                    r#type: "text",
                    placeholder: "https://.../test/your-link",
                    value: "{raw_link}",
                    oninput: move |evt| raw_link.set(evt.value()),
                }
                button {
                    id: "home-open",
                    class: "btn btn-primary",
                    r#type: "button",
                    onclick: move |_| open_link(),
                    "Open Test"
                }
            }
        }
    }
}
