//! Template fields and the merge engine
//!
//! - `Field` / `FieldDescriptor` / `ClientState`: what the client sees and edits
//! - `FieldStore`: the per-session source of truth, synced from the client
//! - `merge`: applies extraction updates with append/replace/dedup rules

pub mod merge;
mod store;
mod types;

pub use merge::{apply_updates, ExtractionUpdate, MergeReport, UpdateAction};
pub use store::{FieldStore, StoreChange};
pub use types::{ClientState, Field, FieldDescriptor};
