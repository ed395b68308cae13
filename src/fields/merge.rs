//! Merge engine
//!
//! Applies AI-proposed field updates onto the client's field values without
//! clobbering earlier work:
//!
//! - `APPEND` adds the value on a new line unless it is already present
//! - `REPLACE` overwrites the value when it differs
//! - `SKIP` and updates for unknown field ids are no-ops
//!
//! Duplicate detection is a case-insensitive substring check after stripping a
//! leading `"* "` bullet. Paraphrases are not detected.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::types::Field;

const BULLET: &str = "* ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UpdateAction {
    #[serde(alias = "append", alias = "Append")]
    Append,
    #[serde(alias = "replace", alias = "Replace")]
    Replace,
    #[serde(alias = "skip", alias = "Skip")]
    Skip,
}

/// One proposed change to one field, produced by a single extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionUpdate {
    pub field_id: String,
    pub action: UpdateAction,
    #[serde(default)]
    pub value: String,
}

impl ExtractionUpdate {
    pub fn new(field_id: impl Into<String>, action: UpdateAction, value: impl Into<String>) -> Self {
        Self {
            field_id: field_id.into(),
            action,
            value: value.into(),
        }
    }
}

/// What a batch of updates did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Ids of fields whose value actually changed, in first-change order
    pub changed: Vec<String>,
    pub duplicates: usize,
    pub unknown: usize,
}

impl MergeReport {
    pub fn has_changes(&self) -> bool {
        !self.changed.is_empty()
    }

    fn mark_changed(&mut self, id: &str) {
        if !self.changed.iter().any(|c| c == id) {
            self.changed.push(id.to_string());
        }
    }
}

/// Apply `updates` in order onto `fields`
pub fn apply_updates(fields: &mut [Field], updates: &[ExtractionUpdate]) -> MergeReport {
    let mut report = MergeReport::default();

    for update in updates {
        let Some(field) = fields.iter_mut().find(|f| f.id == update.field_id) else {
            warn!("Discarding update for unknown field id '{}'", update.field_id);
            report.unknown += 1;
            continue;
        };

        let changed = match update.action {
            UpdateAction::Skip => false,
            UpdateAction::Replace => replace_value(field, &update.value),
            UpdateAction::Append => {
                let appended = append_value(field, &update.value);
                if !appended {
                    report.duplicates += 1;
                }
                appended
            }
        };

        if changed {
            report.mark_changed(&field.id);
        }
    }

    report
}

fn replace_value(field: &mut Field, proposed: &str) -> bool {
    let proposed = proposed.trim();
    if field.current_value == proposed {
        return false;
    }
    field.current_value = proposed.to_string();
    true
}

/// Returns false when the candidate is judged a duplicate
fn append_value(field: &mut Field, candidate: &str) -> bool {
    let candidate = candidate.trim();
    if is_duplicate(&field.current_value, candidate) {
        debug!("Skipping duplicate append for field '{}'", field.id);
        return false;
    }

    if field.current_value.is_empty() {
        field.current_value = candidate.to_string();
    } else {
        field.current_value.push('\n');
        field.current_value.push_str(candidate);
    }
    true
}

fn is_duplicate(existing: &str, candidate: &str) -> bool {
    let normalized = candidate
        .strip_prefix(BULLET)
        .unwrap_or(candidate)
        .trim()
        .to_lowercase();
    existing.to_lowercase().contains(&normalized)
}
