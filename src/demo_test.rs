use super::*;
use crate::manager::Manager;
use crate::state::test_helpers::{
    FetchBehavior, MockResponder, ScriptedFetcher, attached_grid, button_event, cell_center_pixel, modal_event,
    solid_png,
};
use crate::stream::StreamConfig;
use image::Rgba;

const BLUE: [u8; 4] = [0, 0, 0xff, 0xff];

fn demo(url_count: usize) -> (Arc<MockResponder>, Manager, Session) {
    let urls: Vec<String> = (0..url_count).map(|i| format!("https://img.test/{i}.png")).collect();
    let mut fetcher = ScriptedFetcher::new();
    for url in &urls {
        fetcher = fetcher.with(url, FetchBehavior::Ok(solid_png(BLUE)));
    }
    let streamer = Arc::new(ImageStreamer::new(Arc::new(fetcher), StreamConfig::default()));

    let responder = Arc::new(MockResponder::default());
    let mut manager = Manager::new(responder.clone());
    manager.add_pages(pages(streamer, urls));

    let mut session = Session::new("user-1");
    session.set_current_page(MENU);
    (responder, manager, session)
}

async fn click(manager: &Manager, session: &mut Session, custom_id: &str) {
    manager
        .handle_interaction(&button_event(custom_id), session)
        .await;
}

#[tokio::test(start_paused = true)]
async fn gallery_streams_a_grid_when_opened() {
    let (responder, manager, mut session) = demo(9);

    click(&manager, &mut session, OPEN_GALLERY).await;

    assert_eq!(session.current_page(), Some(GALLERY));
    assert_eq!(session.previous_pages(), [MENU]);
    let last = responder.last().unwrap();
    assert!(last.content.contains("Images loaded (0 failed)"), "{}", last.content);
    let grid = attached_grid(&last);
    assert_eq!(cell_center_pixel(&grid, 8, 3), Rgba(BLUE));
    assert!(session.get::<usize>(GRID_BYTES_KEY).is_some());
}

#[tokio::test(start_paused = true)]
async fn gallery_back_returns_to_menu_and_cleans_up() {
    let (_, manager, mut session) = demo(2);
    click(&manager, &mut session, OPEN_GALLERY).await;

    click(&manager, &mut session, BACK).await;

    assert_eq!(session.current_page(), Some(MENU));
    assert!(session.previous_pages().is_empty());
    assert!(!session.contains(GRID_BYTES_KEY));
}

#[tokio::test(start_paused = true)]
async fn gallery_without_urls_stays_on_menu() {
    let (responder, manager, mut session) = demo(0);

    click(&manager, &mut session, OPEN_GALLERY).await;

    assert_eq!(session.current_page(), Some(MENU));
    assert!(responder.last().unwrap().content.contains("No images to show."));
}

#[tokio::test]
async fn note_form_round_trip_updates_menu() {
    let (responder, manager, mut session) = demo(0);

    click(&manager, &mut session, OPEN_NOTE).await;
    assert_eq!(responder.modals()[0].custom_id, NOTE_FORM);

    manager
        .handle_interaction(&modal_event(NOTE_FORM, &[(NOTE_FIELD, "  check case 12 ")]), &mut session)
        .await;

    assert_eq!(session.get::<String>(NOTE_KEY).as_deref(), Some("check case 12"));
    let menu = responder.last().unwrap();
    assert_eq!(menu.panels[0].fields[0].value, "check case 12");
    assert!(menu.content.starts_with("Note saved."));

    // Reopening the form prefills the saved note.
    click(&manager, &mut session, OPEN_NOTE).await;
    assert_eq!(responder.modals()[1].inputs[0].value.as_deref(), Some("check case 12"));
}

#[tokio::test]
async fn empty_note_clears_it() {
    let (_, manager, mut session) = demo(0);
    session.set(NOTE_KEY, "old").unwrap();

    manager
        .handle_interaction(&modal_event(NOTE_FORM, &[(NOTE_FIELD, "   ")]), &mut session)
        .await;

    assert!(!session.contains(NOTE_KEY));
}

#[tokio::test]
async fn moderation_requires_permission() {
    let (responder, manager, mut session) = demo(0);

    click(&manager, &mut session, OPEN_MODERATION).await;
    assert_eq!(session.current_page(), Some(MENU));
    assert!(responder.last().unwrap().content.contains("Timeout Members"));

    let mut moderator = button_event(OPEN_MODERATION);
    moderator.permissions = Permissions::MODERATE_MEMBERS | Permissions::MANAGE_MESSAGES;
    manager.handle_interaction(&moderator, &mut session).await;
    assert_eq!(session.current_page(), Some(MODERATION));
}

#[tokio::test]
async fn close_clears_the_screen() {
    let (responder, manager, mut session) = demo(0);

    click(&manager, &mut session, CLOSE).await;

    let last = responder.last().unwrap();
    assert_eq!(last.content, "Menu closed.");
    assert!(last.rows.is_empty());
}
