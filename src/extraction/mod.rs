//! Periodic field extraction
//!
//! Every scheduler tick the unprocessed transcript delta is sent, together with the
//! template and the values already known, to a text-generation service. The proposed
//! updates come back as JSON and are handed to the merge engine.

mod client;
pub mod parse;
pub mod prompt;
mod scheduler;

pub use client::{Generator, GenerationError, HttpGenerator};
pub use parse::parse_updates;
pub use prompt::build_prompt;
pub use scheduler::{
    ExtractionJob, ExtractionScheduler, SchedulerConfig, SkipReason, TickDecision,
};
