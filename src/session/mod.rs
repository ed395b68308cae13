//! Per-connection session
//!
//! This module provides the `Session` aggregate that ties together:
//! - Audio relay to the upstream transcription stream (with handoff)
//! - Transcript buffering
//! - Field state synced from the client
//! - Periodic extraction and merging of proposed field updates
//! - Status and results sent back to the client

mod config;
pub mod protocol;
mod session;
mod stats;

pub use config::SessionConfig;
pub use protocol::{ClientCommand, ClientFrame, ServerMessage};
pub use session::Session;
pub use stats::SessionStats;
