use dioxus::prelude::*;
use tracing::warn;

use crate::context::AppContext;

const NEXT_STEPS: [&str; 3] = [
    "Your results will be reviewed by the hiring team",
    "You will be contacted via email regarding the next steps",
    "Please do not share the test link with others",
];

#[component]
pub fn CompleteView(link_id: String) -> Element {
    let ctx = use_context::<AppContext>();

    use_hook(move || {
        let registration = ctx.registration();
        spawn(async move {
            if let Err(err) = registration.finish().await {
                warn!(link_id = %link_id, error = %err, "could not clear test progress");
            }
        });
    });

    rsx! {
        div { class: "page page-centered page-complete",
            div { class: "card",
                div { class: "complete-badge", "✓" }
                h1 { "Test Completed!" }
                p { "Thank you for completing the assessment. Your responses have been recorded successfully." }
                div { class: "next-steps",
                    h3 { "What's Next?" }
                    ul {
                        for step in NEXT_STEPS {
                            li { "{step}" }
                        }
                    }
                }
                p { class: "muted", "You may now close this window." }
            }
        }
    }
}
