use proctor_core::model::LinkId;

use super::test_harness::{LINK, ViewKind, setup_view_harness};

#[tokio::test(flavor = "current_thread")]
async fn home_view_smoke_asks_for_a_link() {
    let mut harness = setup_view_harness(ViewKind::Home);
    harness.rebuild();
    let html = harness.render();
    assert!(html.contains("Open Test"), "missing open button in {html}");
    assert!(html.contains("Online Assessment"), "missing title in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn landing_view_smoke_renders_instructions() {
    let mut harness = setup_view_harness(ViewKind::Landing(LINK));
    harness.rebuild();
    harness.settle().await;
    let html = harness.render();
    assert!(html.contains("Quiz"), "missing test name in {html}");
    assert!(html.contains("10 Seconds Per Question"), "missing timing in {html}");
    assert!(html.contains("One question at a time"), "missing rules in {html}");
    assert!(html.contains("Continue to Registration"), "missing continue in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn landing_view_smoke_shows_refusal_verbatim() {
    let mut harness = setup_view_harness(ViewKind::Landing("missing"));
    harness.rebuild();
    harness.settle().await;
    let html = harness.render();
    assert!(html.contains("Link Not Valid"), "missing heading in {html}");
    assert!(html.contains("Test link not found"), "missing detail in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn test_view_smoke_renders_first_question() {
    let mut harness = setup_view_harness(ViewKind::Take(LINK));
    harness
        .registration()
        .register(
            &LinkId::new(LINK).unwrap(),
            "Alan Turing",
            "alan@example.com",
            "5551234567",
        )
        .await
        .expect("register");

    harness.rebuild();
    harness.settle().await;
    let html = harness.render();
    assert!(html.contains("1 / 2"), "missing header in {html}");
    assert!(html.contains("Which planet is largest?"), "missing question in {html}");
    assert!(html.contains("Submit &amp; Next") || html.contains("Submit & Next"), "missing submit in {html}");
    assert!(html.contains("10s"), "missing seconds label in {html}");
    assert!(html.contains("0:20"), "missing total clock in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn complete_view_smoke_clears_progress() {
    let mut harness = setup_view_harness(ViewKind::Complete(LINK));
    let registration = harness.registration();
    registration
        .register(
            &LinkId::new(LINK).unwrap(),
            "Alan Turing",
            "alan@example.com",
            "5551234567",
        )
        .await
        .expect("register");
    assert!(registration.active_session().await.is_some());

    harness.rebuild();
    harness.settle().await;
    let html = harness.render();
    assert!(html.contains("Test Completed!"), "missing title in {html}");
    assert_eq!(registration.active_session().await, None);
}
