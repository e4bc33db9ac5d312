use super::*;
use crate::message::{Attachment, SelectOption, TextInput};
use crate::test_helpers;

#[test]
fn message_payload_maps_panels_rows_and_attachments() {
    let message = OutboundMessage::new("Case #12")
        .with_panel(
            Panel::new("Case")
                .with_description("Spam report")
                .with_field("Status", "open", true)
                .with_image("attachment://grid.png"),
        )
        .with_row(vec![
            Component::button("cases:back", "Back", ButtonStyle::Secondary),
            Component::button("cases:ban", "Ban", ButtonStyle::Danger).disabled(true),
        ])
        .with_row(vec![])
        .with_attachments(vec![Attachment::new("grid.png", vec![0; 4])]);

    let payload = message_payload(&message);

    assert_eq!(payload["content"], "Case #12");
    assert_eq!(payload["embeds"][0]["title"], "Case");
    assert_eq!(payload["embeds"][0]["fields"][0]["name"], "Status");
    assert_eq!(payload["embeds"][0]["image"]["url"], "attachment://grid.png");
    // Empty rows are dropped.
    assert_eq!(payload["components"].as_array().map(Vec::len), Some(1));
    assert_eq!(payload["components"][0]["components"][1]["style"], 4);
    assert_eq!(payload["components"][0]["components"][1]["disabled"], true);
    assert_eq!(payload["attachments"][0]["filename"], "grid.png");
}

#[test]
fn select_payload_carries_options() {
    let message = OutboundMessage::default().with_row(vec![Component::select(
        "settings:pick",
        "Choose",
        vec![SelectOption::new("Logs", "logs").selected(true)],
    )]);

    let payload = message_payload(&message);
    let select = &payload["components"][0]["components"][0];
    assert_eq!(select["type"], 3);
    assert_eq!(select["options"][0]["value"], "logs");
    assert_eq!(select["options"][0]["default"], true);
}

#[test]
fn modal_payload_wraps_each_input_in_a_row() {
    let modal = ModalSpec::new("ban:reason", "Ban reason")
        .with_input(TextInput::new("reason", "Reason", TextInputStyle::Paragraph).prefilled("spam"))
        .with_input(TextInput::new("days", "Delete days", TextInputStyle::Short).optional());

    let payload = modal_payload(&modal);

    assert_eq!(payload["type"], 9);
    assert_eq!(payload["data"]["custom_id"], "ban:reason");
    let rows = payload["data"]["components"].as_array().expect("rows");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["components"][0]["style"], 2);
    assert_eq!(rows[0]["components"][0]["value"], "spam");
    assert_eq!(rows[1]["components"][0]["required"], false);
}

#[test]
fn parse_message_id_requires_id() {
    assert_eq!(parse_message_id(r#"{"id":"42"}"#).unwrap(), MessageId("42".into()));
    assert!(matches!(parse_message_id("{}"), Err(ResponseError::Parse(_))));
    assert!(matches!(parse_message_id("nope"), Err(ResponseError::Parse(_))));
}

#[test]
fn webhook_urls_use_token_and_application() {
    let mut config = test_helpers::test_config();
    config.api_base = "https://platform.test/api/".into();
    config.application_id = "app-1".into();
    let responder = WebhookResponder::new(&config).expect("client builds");
    let event = test_helpers::button_event("x");

    assert_eq!(
        responder.original_message_url(&event),
        format!("https://platform.test/api/webhooks/app-1/{}/messages/@original", event.token)
    );
    assert_eq!(
        responder.callback_url(&event),
        format!("https://platform.test/api/interactions/{}/{}/callback", event.id, event.token)
    );
}

#[test]
fn retryable_statuses() {
    assert!(ResponseError::Request("reset".into()).retryable());
    assert!(ResponseError::Status { status: 429, body: String::new() }.retryable());
    assert!(ResponseError::Status { status: 502, body: String::new() }.retryable());
    assert!(!ResponseError::Status { status: 404, body: String::new() }.retryable());
    assert!(!ResponseError::Parse("x".into()).retryable());
}
