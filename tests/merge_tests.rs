// Tests for the merge engine: append/replace/skip semantics and duplicate detection.

use field_scribe::{apply_updates, ExtractionUpdate, Field, UpdateAction};

fn field(id: &str, value: &str) -> Field {
    Field {
        id: id.to_string(),
        name: id.to_string(),
        hint: String::new(),
        current_value: value.to_string(),
    }
}

#[test]
fn test_append_to_empty_field_has_no_leading_newline() {
    let mut fields = vec![field("facts", "")];
    let report = apply_updates(
        &mut fields,
        &[ExtractionUpdate::new("facts", UpdateAction::Append, "* new fact")],
    );

    assert_eq!(fields[0].current_value, "* new fact");
    assert_eq!(report.changed, vec!["facts".to_string()]);
}

#[test]
fn test_append_adds_new_line() {
    let mut fields = vec![field("facts", "* likes tea")];
    apply_updates(
        &mut fields,
        &[ExtractionUpdate::new("facts", UpdateAction::Append, "  * plays chess  ")],
    );

    assert_eq!(fields[0].current_value, "* likes tea\n* plays chess");
}

#[test]
fn test_append_case_insensitive_duplicate_is_skipped() {
    let mut fields = vec![field("facts", "* likes tea")];
    let report = apply_updates(
        &mut fields,
        &[ExtractionUpdate::new("facts", UpdateAction::Append, "* Likes Tea")],
    );

    assert_eq!(fields[0].current_value, "* likes tea");
    assert!(!report.has_changes());
    assert_eq!(report.duplicates, 1);
}

#[test]
fn test_same_append_twice_stores_one_copy() {
    let mut fields = vec![field("facts", "")];
    let update = ExtractionUpdate::new("facts", UpdateAction::Append, "* Works remotely");

    apply_updates(&mut fields, &[update.clone(), update.clone()]);
    let report = apply_updates(&mut fields, &[update]);

    assert_eq!(fields[0].current_value, "* Works remotely");
    assert!(!report.has_changes());
}

#[test]
fn test_append_substring_counts_as_duplicate() {
    // Containment, not equality: a shorter restatement is dropped
    let mut fields = vec![field("facts", "* Moved to Berlin in 2019")];
    apply_updates(
        &mut fields,
        &[ExtractionUpdate::new("facts", UpdateAction::Append, "* moved to berlin")],
    );

    assert_eq!(fields[0].current_value, "* Moved to Berlin in 2019");
}

#[test]
fn test_replace_with_different_value() {
    let mut fields = vec![field("status", "pending")];
    let report = apply_updates(
        &mut fields,
        &[ExtractionUpdate::new("status", UpdateAction::Replace, "  approved ")],
    );

    assert_eq!(fields[0].current_value, "approved");
    assert!(report.has_changes());
}

#[test]
fn test_replace_with_equal_value_is_no_change() {
    let mut fields = vec![field("status", "approved")];
    let report = apply_updates(
        &mut fields,
        &[ExtractionUpdate::new("status", UpdateAction::Replace, "approved\n")],
    );

    assert_eq!(fields[0].current_value, "approved");
    assert!(!report.has_changes());
}

#[test]
fn test_skip_and_unknown_field_are_ignored() {
    let mut fields = vec![field("a", "keep")];
    let report = apply_updates(
        &mut fields,
        &[
            ExtractionUpdate::new("a", UpdateAction::Skip, "ignored"),
            ExtractionUpdate::new("missing", UpdateAction::Append, "* orphan"),
        ],
    );

    assert_eq!(fields[0].current_value, "keep");
    assert!(!report.has_changes());
    assert_eq!(report.unknown, 1);
}

#[test]
fn test_changed_ids_are_reported_once_in_order() {
    let mut fields = vec![field("a", ""), field("b", "")];
    let report = apply_updates(
        &mut fields,
        &[
            ExtractionUpdate::new("b", UpdateAction::Append, "* one"),
            ExtractionUpdate::new("a", UpdateAction::Replace, "x"),
            ExtractionUpdate::new("b", UpdateAction::Append, "* two"),
        ],
    );

    assert_eq!(report.changed, vec!["b".to_string(), "a".to_string()]);
    assert_eq!(fields[1].current_value, "* one\n* two");
}

#[test]
fn test_update_deserializes_from_generator_json() {
    let update: ExtractionUpdate =
        serde_json::from_str(r#"{"fieldId":"a","action":"append","value":"* x"}"#).unwrap();
    assert_eq!(update, ExtractionUpdate::new("a", UpdateAction::Append, "* x"));

    let update: ExtractionUpdate =
        serde_json::from_str(r#"{"fieldId":"a","action":"SKIP"}"#).unwrap();
    assert_eq!(update.action, UpdateAction::Skip);
    assert_eq!(update.value, "");
}
