// Tests for parsing generation output into field updates.

use field_scribe::extraction::parse_updates;
use field_scribe::{ExtractionUpdate, UpdateAction};

#[test]
fn test_parses_updates_object() {
    let raw = r#"{"updates":[
        {"fieldId":"a","action":"APPEND","value":"* likes tea"},
        {"fieldId":"b","action":"REPLACE","value":"Berlin"},
        {"fieldId":"c","action":"SKIP","value":""}
    ]}"#;

    let updates = parse_updates(raw).unwrap();

    assert_eq!(
        updates,
        vec![
            ExtractionUpdate::new("a", UpdateAction::Append, "* likes tea"),
            ExtractionUpdate::new("b", UpdateAction::Replace, "Berlin"),
            ExtractionUpdate::new("c", UpdateAction::Skip, ""),
        ]
    );
}

#[test]
fn test_empty_update_list_is_a_valid_result() {
    assert_eq!(parse_updates(r#"{"updates":[]}"#), Some(Vec::new()));
    assert_eq!(parse_updates("{}"), Some(Vec::new()));
}

#[test]
fn test_parses_bare_array() {
    let updates = parse_updates(r#"[{"fieldId":"a","action":"append","value":"x"}]"#).unwrap();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].action, UpdateAction::Append);
}

#[test]
fn test_parses_fenced_output() {
    let raw = "```json\n{\"updates\":[{\"fieldId\":\"a\",\"action\":\"REPLACE\",\"value\":\"v\"}]}\n```";
    let updates = parse_updates(raw).unwrap();
    assert_eq!(updates[0].value, "v");
}

#[test]
fn test_recovers_object_surrounded_by_prose() {
    let raw = "Sure! Here are the updates:\n{\"updates\":[{\"fieldId\":\"a\",\"action\":\"APPEND\",\"value\":\"* x\"}]}\nLet me know if you need more.";

    let updates = parse_updates(raw).unwrap();

    assert_eq!(updates, vec![ExtractionUpdate::new("a", UpdateAction::Append, "* x")]);
}

#[test]
fn test_recovers_first_complete_update_from_truncated_output() {
    let raw = r#"{"updates":[{"fieldId":"a","action":"APPEND","value":"* first"},{"fieldId":"b","act"#;

    let updates = parse_updates(raw).unwrap();

    assert_eq!(updates, vec![ExtractionUpdate::new("a", UpdateAction::Append, "* first")]);
}

#[test]
fn test_drops_malformed_entries() {
    let raw = r#"{"updates":[
        {"fieldId":"a","action":"MERGE","value":"?"},
        {"action":"APPEND","value":"no id"},
        {"fieldId":"b","action":"APPEND","value":"* ok"}
    ]}"#;

    let updates = parse_updates(raw).unwrap();

    assert_eq!(updates, vec![ExtractionUpdate::new("b", UpdateAction::Append, "* ok")]);
}

#[test]
fn test_unusable_output_is_none() {
    assert_eq!(parse_updates(""), None);
    assert_eq!(parse_updates("I could not find anything."), None);
    assert_eq!(parse_updates(r#"{"updates":"none"}"#), None);
    assert_eq!(parse_updates("42"), None);
}
