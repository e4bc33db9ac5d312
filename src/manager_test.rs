use super::*;
use crate::message::{ButtonStyle, Component, Panel};
use crate::state::test_helpers::{MockResponder, button_event, command_event, modal_event, select_event};

fn page(name: &'static str) -> Page {
    Page::new(name, move |_: &Session| {
        OutboundMessage::new(format!("{name} screen"))
            .with_row(vec![Component::button(format!("{name}:next"), "Next", ButtonStyle::Primary)])
    })
}

fn manager_with(pages: impl IntoIterator<Item = Page>) -> (Arc<MockResponder>, Manager) {
    let responder = Arc::new(MockResponder::default());
    let mut manager = Manager::new(responder.clone());
    manager.add_pages(pages);
    (responder, manager)
}

fn session_on(page: &str) -> Session {
    let mut session = Session::new("user-1");
    session.set_current_page(page);
    session
}

// =============================================================================
// REGISTRY
// =============================================================================

#[test]
fn add_pages_replaces_duplicates() {
    let (_, mut manager) = manager_with([page("home"), page("cases")]);
    manager.add_pages([Page::new("home", |_: &Session| OutboundMessage::new("replacement"))]);

    assert_eq!(manager.page_count(), 2);
    let home = manager.page("home").unwrap();
    assert_eq!(home.build_message(&Session::new("u")).content, "replacement");
}

// =============================================================================
// HISTORY
// =============================================================================

#[test]
fn update_page_sets_first_page_without_history() {
    let (_, manager) = manager_with([page("home")]);
    let mut session = Session::new("user-1");

    manager.update_page(&mut session, manager.page("home").unwrap());

    assert_eq!(session.current_page(), Some("home"));
    assert!(session.previous_pages().is_empty());
}

#[test]
fn revisiting_a_page_collapses_history() {
    let (_, manager) = manager_with([page("a"), page("b")]);
    let mut session = session_on("a");

    manager.update_page(&mut session, manager.page("b").unwrap());
    assert_eq!(session.previous_pages(), ["a"]);

    manager.update_page(&mut session, manager.page("a").unwrap());
    assert_eq!(session.current_page(), Some("a"));
    assert!(session.previous_pages().is_empty());
}

#[test]
fn revisit_truncates_everything_after_the_entry() {
    let (_, manager) = manager_with([page("a"), page("b"), page("c"), page("d")]);
    let mut session = session_on("a");
    for name in ["b", "c", "d"] {
        manager.update_page(&mut session, manager.page(name).unwrap());
    }
    assert_eq!(session.previous_pages(), ["a", "b", "c"]);

    manager.update_page(&mut session, manager.page("b").unwrap());

    assert_eq!(session.current_page(), Some("b"));
    assert_eq!(session.previous_pages(), ["a"]);
}

#[test]
fn same_page_update_leaves_history_alone() {
    let (_, manager) = manager_with([page("a"), page("b")]);
    let mut session = session_on("a");
    manager.update_page(&mut session, manager.page("b").unwrap());

    manager.update_page(&mut session, manager.page("b").unwrap());

    assert_eq!(session.previous_pages(), ["a"]);
}

#[test]
fn on_reset_runs_only_when_pushed() {
    let counted = page("b").on_reset(|session| {
        let resets = session.get::<u32>("resets").unwrap_or(0);
        session.set("resets", resets + 1).unwrap();
    });
    let (_, manager) = manager_with([page("a"), counted, page("c")]);
    let mut session = session_on("a");

    manager.update_page(&mut session, manager.page("b").unwrap());
    manager.update_page(&mut session, manager.page("c").unwrap());
    manager.update_page(&mut session, manager.page("b").unwrap());

    assert_eq!(session.get::<u32>("resets"), Some(1));
    assert_eq!(session.previous_pages(), ["a"]);
}

// =============================================================================
// DISPLAY / SHOW
// =============================================================================

#[tokio::test]
async fn display_renders_page_with_status_line() {
    let (responder, manager) = manager_with([page("a"), page("b")]);
    let mut session = session_on("a");
    let event = button_event("a:next");

    manager
        .display(&event, &mut session, manager.page("b").unwrap(), "Saved", Vec::new())
        .await;

    let message = responder.last().unwrap();
    assert!(message.content.starts_with("b screen\nSaved\n-# Updated "));
    assert_eq!(message.rows.len(), 1);
    assert_eq!(session.current_page(), Some("b"));
}

#[tokio::test]
async fn display_updates_page_even_when_render_fails() {
    let (responder, manager) = manager_with([page("a"), page("b")]);
    responder.fail_updates(true);
    let mut session = session_on("a");

    manager
        .display(&button_event("a:next"), &mut session, manager.page("b").unwrap(), "", Vec::new())
        .await;

    assert_eq!(responder.updates().len(), 1);
    assert_eq!(session.current_page(), Some("b"));
    assert_eq!(session.previous_pages(), ["a"]);
}

#[tokio::test]
async fn show_unknown_page_is_dropped() {
    let (responder, manager) = manager_with([page("a")]);
    let mut session = session_on("a");

    manager
        .show(&button_event("a:next"), &mut session, "missing", "")
        .await;

    assert!(responder.updates().is_empty());
    assert_eq!(session.current_page(), Some("a"));
}

#[tokio::test]
async fn on_show_pass_falls_back_to_display() {
    let shown = page("b").on_show(|mut ctx| {
        Box::pin(async move {
            ctx.session_mut().set("visited", true).unwrap();
            Handled::Pass(ctx)
        })
    });
    let (responder, manager) = manager_with([page("a"), shown]);
    let mut session = session_on("a");

    manager
        .show(&button_event("a:next"), &mut session, "b", "")
        .await;

    assert_eq!(session.get::<bool>("visited"), Some(true));
    assert_eq!(session.current_page(), Some("b"));
    assert!(responder.last().unwrap().content.starts_with("b screen"));
}

#[tokio::test]
async fn on_show_done_skips_display() {
    let redirecting = page("b").on_show(|ctx| Box::pin(async move { Handled::Done(ctx.clear("Nothing to show").await) }));
    let (responder, manager) = manager_with([page("a"), redirecting]);
    let mut session = session_on("a");

    manager
        .show(&button_event("a:next"), &mut session, "b", "")
        .await;

    assert_eq!(responder.updates().len(), 1);
    assert_eq!(responder.last().unwrap().content, "Nothing to show");
    assert_eq!(session.current_page(), Some("a"));
}

// =============================================================================
// DISPATCH
// =============================================================================

#[tokio::test]
async fn button_routes_to_current_page_hook() {
    let clicking = page("a").on_button(|mut ctx, custom_id| {
        Box::pin(async move {
            ctx.session_mut().set("clicked", custom_id).unwrap();
            ctx.reload("Clicked").await
        })
    });
    let (responder, manager) = manager_with([clicking]);
    let mut session = session_on("a");

    manager
        .handle_interaction(&button_event("a:next"), &mut session)
        .await;

    assert_eq!(session.get::<String>("clicked").as_deref(), Some("a:next"));
    assert!(responder.last().unwrap().content.contains("Clicked"));
}

#[tokio::test]
async fn select_routes_values_to_hook() {
    let selecting = page("a").on_select(|mut ctx, _, values| {
        Box::pin(async move {
            ctx.session_mut().set("picked", values).unwrap();
            ctx.reload("").await
        })
    });
    let (_, manager) = manager_with([selecting]);
    let mut session = session_on("a");

    manager
        .handle_interaction(&select_event("a:pick", &["x", "y"]), &mut session)
        .await;

    assert_eq!(session.get::<Vec<String>>("picked"), Some(vec!["x".to_string(), "y".to_string()]));
}

#[tokio::test]
async fn modal_submit_routes_to_hook_with_fields() {
    let submitting = page("a").on_modal(|mut ctx| {
        Box::pin(async move {
            let reason = ctx.event().modal_field("reason").unwrap_or_default().to_string();
            ctx.session_mut().set("reason", reason).unwrap();
            ctx.reload("Saved").await
        })
    });
    let (_, manager) = manager_with([submitting]);
    let mut session = session_on("a");

    manager
        .handle_interaction(&modal_event("a:form", &[("reason", "spam")]), &mut session)
        .await;

    assert_eq!(session.get::<String>("reason").as_deref(), Some("spam"));
}

#[tokio::test]
async fn modal_submit_without_hook_leaves_session_unchanged() {
    let (responder, manager) = manager_with([page("a"), page("b")]);
    let mut session = session_on("a");
    manager.update_page(&mut session, manager.page("b").unwrap());
    session.set("draft", "text").unwrap();
    let before = session.clone();

    manager
        .handle_interaction(&modal_event("b:form", &[("reason", "x")]), &mut session)
        .await;

    assert!(responder.updates().is_empty());
    assert_eq!(session.current_page(), before.current_page());
    assert_eq!(session.previous_pages(), before.previous_pages());
    assert_eq!(session.get::<String>("draft").as_deref(), Some("text"));
    assert!(!session.is_ended());
}

#[tokio::test]
async fn interaction_without_current_page_reports_expiry() {
    let (responder, manager) = manager_with([page("a")]);
    let mut session = Session::new("user-1");

    manager
        .handle_interaction(&button_event("a:next"), &mut session)
        .await;

    let message = responder.last().unwrap();
    assert_eq!(message.panels[0].description.as_deref(), Some(EXPIRED_MESSAGE));
}

#[tokio::test]
async fn interaction_on_unregistered_page_reports_expiry() {
    let (responder, manager) = manager_with([page("a")]);
    let mut session = session_on("retired");

    manager
        .handle_interaction(&button_event("retired:next"), &mut session)
        .await;

    assert_eq!(responder.last().unwrap().panels[0].description.as_deref(), Some(EXPIRED_MESSAGE));
}

#[tokio::test]
async fn commands_are_not_dispatched_to_pages() {
    let (responder, manager) = manager_with([page("a")]);
    let mut session = session_on("a");

    manager
        .handle_interaction(&command_event("menu"), &mut session)
        .await;

    assert!(responder.updates().is_empty());
}

// =============================================================================
// ONE-SHOT RESPONSES
// =============================================================================

#[tokio::test]
async fn respond_with_error_sends_banner_without_controls() {
    let (responder, manager) = manager_with([page("a")]);

    manager
        .respond_with_error(&button_event("x"), "Case not found")
        .await;

    let message = responder.last().unwrap();
    assert!(message.rows.is_empty());
    assert_eq!(
        message.panels,
        vec![Panel::new("Something went wrong").with_description("Case not found").with_color(crate::message::ERROR_COLOR)]
    );
}

#[test]
fn status_line_formats_utc_time() {
    let now = OffsetDateTime::from_unix_timestamp(3723).unwrap();
    assert_eq!(status_line("", now), "-# Updated 01:02:03 UTC");
    assert_eq!(status_line("Saved", now), "Saved\n-# Updated 01:02:03 UTC");
}
