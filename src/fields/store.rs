use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};

use super::types::{ClientState, Field, FieldDescriptor};

/// Result of a template or context change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreChange {
    /// The set of field ids differs from the previously active template
    pub field_set_changed: bool,
}

/// Per-session field state: the active template plus the client's current values
///
/// The `ClientState` is what merges are applied to; the template is what the
/// extraction prompt asks for.
#[derive(Debug, Default)]
pub struct FieldStore {
    template: Vec<FieldDescriptor>,
    state: ClientState,
    /// Bumped whenever the field-id set changes
    epoch: u64,
}

impl FieldStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Legacy `updateTemplate:` command
    ///
    /// Replaces the active template. If the client state holds no fields yet, it is
    /// seeded with one empty-valued field per descriptor.
    pub fn set_template(&mut self, template: Vec<FieldDescriptor>) -> StoreChange {
        let change = self.compare_ids(template.iter().map(|d| d.id.as_str()));

        if self.state.fields.is_empty() {
            self.state.fields = template.iter().map(Field::empty).collect();
            debug!("Seeded {} empty fields from template", self.state.fields.len());
        }

        info!("Template set: {} fields", template.len());
        self.template = template;
        self.record(change)
    }

    /// `contextUpdate` message: the client's full field list with values, plus notes
    pub fn sync_context(&mut self, state: ClientState) -> StoreChange {
        let change = self.compare_ids(state.fields.iter().map(|f| f.id.as_str()));

        self.template = state.fields.iter().map(Field::descriptor).collect();
        self.state = state;

        debug!(
            "Context synced: {} fields, {} chars of notes",
            self.state.fields.len(),
            self.state.user_notes.len()
        );
        self.record(change)
    }

    /// Recover an empty template from the client's field list
    ///
    /// Returns true if a usable template is available afterwards.
    pub fn ensure_template(&mut self) -> bool {
        if self.template.is_empty() && !self.state.fields.is_empty() {
            self.template = self.state.fields.iter().map(Field::descriptor).collect();
            info!(
                "Recovered template from client fields ({} fields)",
                self.template.len()
            );
        }
        !self.template.is_empty()
    }

    pub fn template(&self) -> &[FieldDescriptor] {
        &self.template
    }

    pub fn state(&self) -> &ClientState {
        &self.state
    }

    pub fn fields(&self) -> &[Field] {
        &self.state.fields
    }

    pub fn fields_mut(&mut self) -> &mut [Field] {
        &mut self.state.fields
    }

    pub fn user_notes(&self) -> &str {
        &self.state.user_notes
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Flat `fieldId -> currentValue` map of the whole document
    pub fn values(&self) -> BTreeMap<String, String> {
        self.state
            .fields
            .iter()
            .map(|f| (f.id.clone(), f.current_value.clone()))
            .collect()
    }

    fn compare_ids<'a>(&self, incoming: impl Iterator<Item = &'a str>) -> StoreChange {
        let incoming: HashSet<&str> = incoming.collect();
        let active: HashSet<&str> = self.template.iter().map(|d| d.id.as_str()).collect();
        StoreChange {
            field_set_changed: incoming != active,
        }
    }

    fn record(&mut self, change: StoreChange) -> StoreChange {
        if change.field_set_changed {
            self.epoch += 1;
        }
        change
    }
}
