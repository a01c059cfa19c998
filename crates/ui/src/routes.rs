use dioxus::prelude::*;
use dioxus_router::{Outlet, Routable};

use crate::views::{CompleteView, HomeView, LandingView, TestView};

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
pub enum Route {
    #[layout(Layout)]
        #[route("/", HomeView)] Home {},
        #[route("/test/:link_id", LandingView)] Landing { link_id: String },
        #[route("/test/:link_id/take", TestView)] Take { link_id: String },
        #[route("/test/:link_id/complete", CompleteView)] Complete { link_id: String },
}

#[component]
fn Layout() -> Element {
    rsx! {
        div { class: "app",
            main { class: "content",
                Outlet::<Route> {}
            }
        }
    }
}
