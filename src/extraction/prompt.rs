//! Extraction prompt construction
//!
//! The prompt carries the template, the values already captured (so the model can
//! avoid repeating them), optional user notes, and only the unprocessed transcript
//! delta.

use std::fmt::Write;

use crate::fields::{Field, FieldDescriptor};

pub const SYSTEM_PROMPT: &str = "You extract structured information from live conversation \
transcripts into a fixed set of fields. Reply with a single JSON object and nothing else.";

/// Build the user prompt for one extraction call
pub fn build_prompt(
    template: &[FieldDescriptor],
    fields: &[Field],
    user_notes: &str,
    delta: &str,
) -> String {
    let mut prompt = String::new();

    prompt.push_str("FIELDS TO FILL:\n");
    for descriptor in template {
        let _ = write!(prompt, "- id: {} | name: {}", descriptor.id, descriptor.name);
        if !descriptor.hint.trim().is_empty() {
            let _ = write!(prompt, " | look for: {}", descriptor.hint.trim());
        }
        prompt.push('\n');
    }

    prompt.push_str("\nALREADY CAPTURED (do not repeat these facts):\n");
    for descriptor in template {
        let value = fields
            .iter()
            .find(|f| f.id == descriptor.id)
            .map(|f| f.current_value.trim())
            .unwrap_or("");
        if value.is_empty() {
            let _ = writeln!(prompt, "[{}] (empty)", descriptor.id);
        } else {
            let _ = writeln!(prompt, "[{}]\n{}", descriptor.id, value);
        }
    }

    if !user_notes.trim().is_empty() {
        let _ = write!(
            prompt,
            "\nUSER NOTES (context only, never copy into fields):\n{}\n",
            user_notes.trim()
        );
    }

    let _ = write!(prompt, "\nNEW TRANSCRIPT SINCE LAST UPDATE:\n{}\n", delta.trim());

    prompt.push_str(
        "\nRULES:\n\
         - Only use facts stated in the new transcript.\n\
         - APPEND adds a new fact as a single line starting with \"* \".\n\
         - REPLACE overwrites a field whose value has changed or been corrected.\n\
         - SKIP (or omit) fields with nothing new.\n\
         - Use only the field ids listed above.\n\
         \nRESPOND WITH JSON ONLY:\n\
         {\"updates\":[{\"fieldId\":\"<id>\",\"action\":\"APPEND|REPLACE|SKIP\",\"value\":\"<text>\"}]}\n",
    );

    prompt
}
