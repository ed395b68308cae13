//! Generation output parsing
//!
//! Model output is expected to be `{"updates":[...]}` but is often wrapped in code
//! fences, truncated, or surrounded by prose. Parsing tries, in order:
//! the whole (fence-stripped) text, then the first well-formed `{...}` object found
//! anywhere in it. Update entries that do not deserialize are dropped one by one.

use serde_json::Value;
use tracing::debug;

use crate::fields::ExtractionUpdate;

/// Parse the proposed updates out of raw generation output
///
/// `None` means nothing usable was found (the tick becomes a no-op);
/// `Some(vec![])` means a well-formed result with no updates.
pub fn parse_updates(raw: &str) -> Option<Vec<ExtractionUpdate>> {
    let text = strip_code_fence(raw.trim());

    if let Ok(value) = serde_json::from_str::<Value>(text) {
        if let Some(updates) = updates_from_value(value) {
            return Some(updates);
        }
    }

    let value = first_json_object(text)?;
    debug!("Recovered JSON object from unstructured generation output");
    updates_from_value(value)
}

fn updates_from_value(value: Value) -> Option<Vec<ExtractionUpdate>> {
    let entries = match value {
        Value::Array(entries) => entries,
        Value::Object(mut object) => match object.remove("updates") {
            Some(Value::Array(entries)) => entries,
            Some(Value::Null) => Vec::new(),
            // A bare update object, e.g. recovered from truncated output
            None if object.contains_key("fieldId") => vec![Value::Object(object)],
            None => Vec::new(),
            Some(_) => return None,
        },
        _ => return None,
    };

    let total = entries.len();
    let updates: Vec<ExtractionUpdate> = entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value(entry).ok())
        .collect();

    if updates.len() < total {
        debug!("Dropped {} malformed update entries", total - updates.len());
    }
    Some(updates)
}

/// Find the first brace-delimited substring that parses as a JSON object
fn first_json_object(text: &str) -> Option<Value> {
    text.match_indices('{').find_map(|(start, _)| {
        let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(value @ Value::Object(_))) => Some(value),
            _ => None,
        }
    })
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop an optional language tag on the opening fence line
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    rest.trim_end()
        .strip_suffix("```")
        .unwrap_or(rest)
        .trim()
}
