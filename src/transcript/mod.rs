//! Transcript accumulation
//!
//! Finalized transcript segments are appended to a size-capped buffer together with
//! a "processed cursor" marking how far the extraction step has already read.

mod buffer;

pub use buffer::{TranscriptBuffer, DEFAULT_KEEP_SUFFIX, DEFAULT_TRIM_THRESHOLD};
