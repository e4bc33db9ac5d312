use super::*;
use serde_json::json;

fn parse(value: serde_json::Value) -> Interaction {
    serde_json::from_value(value).expect("interaction should parse")
}

#[test]
fn parses_button_click_with_string_permissions() {
    let event = parse(json!({
        "id": "i-1",
        "token": "tok",
        "actor": {"id": "u-1", "name": "mod"},
        "guild_id": "g-1",
        "permissions": "4",
        "kind": {"type": "component", "custom_id": "cases:next", "component": "button"}
    }));

    assert_eq!(event.kind_label(), "button");
    assert_eq!(event.custom_id(), Some("cases:next"));
    assert!(event.selected_values().is_empty());
    assert!(event.permissions().contains(Permissions::BAN_MEMBERS));
    assert!(!event.permissions().contains(Permissions::MANAGE_GUILD));
    assert_eq!(event.session_key(), "g-1:u-1");
}

#[test]
fn parses_select_values_and_numeric_permissions() {
    let event = parse(json!({
        "id": "i-2",
        "token": "tok",
        "actor": {"id": "u-1", "name": "mod"},
        "permissions": 8,
        "kind": {"type": "component", "custom_id": "settings:pick", "component": "select", "values": ["a", "b"]}
    }));

    assert_eq!(event.kind_label(), "select");
    assert_eq!(event.selected_values(), ["a".to_string(), "b".to_string()]);
    assert_eq!(event.session_key(), "dm:u-1");
    // Administrator implies everything.
    assert!(event.permissions().contains(Permissions::MODERATE_MEMBERS));
}

#[test]
fn rejects_garbage_permission_string() {
    let result = serde_json::from_value::<Interaction>(json!({
        "id": "i-3",
        "token": "tok",
        "actor": {"id": "u-1", "name": "mod"},
        "permissions": "lots",
        "kind": {"type": "command", "name": "cases"}
    }));
    assert!(result.is_err());
}

#[test]
fn modal_submit_exposes_fields_but_cannot_open_modal() {
    let event = parse(json!({
        "id": "i-4",
        "token": "tok",
        "actor": {"id": "u-1", "name": "mod"},
        "kind": {"type": "modal_submit", "custom_id": "ban:reason", "fields": {"reason": "spam"}}
    }));

    assert_eq!(event.modal_field("reason"), Some("spam"));
    assert_eq!(event.modal_field("other"), None);

    let err = event.ensure_can_open_modal().unwrap_err();
    assert!(err.to_string().contains("modal_submit"));
}

#[test]
fn command_has_name_but_no_custom_id() {
    let event = parse(json!({
        "id": "i-5",
        "token": "tok",
        "actor": {"id": "u-1", "name": "mod"},
        "kind": {"type": "command", "name": "settings"}
    }));

    assert_eq!(event.command_name(), Some("settings"));
    assert_eq!(event.custom_id(), None);
    assert_eq!(event.modal_field("reason"), None);
    assert!(event.ensure_can_open_modal().is_ok());
    assert_eq!(event.to_string(), "command(settings) by u-1");
}

#[test]
fn permissions_combine_with_bitor() {
    let perms = Permissions::KICK_MEMBERS | Permissions::BAN_MEMBERS;
    assert!(perms.contains(Permissions::KICK_MEMBERS));
    assert!(perms.contains(Permissions::KICK_MEMBERS | Permissions::BAN_MEMBERS));
    assert!(!perms.contains(Permissions::MANAGE_MESSAGES));
    assert_eq!(Permissions::from_bits(perms.bits()), perms);
}
