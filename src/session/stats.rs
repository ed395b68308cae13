use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of a session's progress
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub session_id: String,

    /// When the client connected
    pub started_at: DateTime<Utc>,

    /// False once the session has been torn down
    pub active: bool,

    /// Finalized transcript segments received
    pub transcript_segments: usize,

    /// Current transcript buffer length and processed cursor (bytes)
    pub transcript_len: usize,
    pub processed_cursor: usize,

    pub fields_count: usize,

    pub extractions_run: u64,
    pub extractions_failed: u64,
    pub extractions_timed_out: u64,

    /// Upstream connection renewals
    pub handoffs: u64,
}

impl SessionStats {
    pub fn new(session_id: String) -> Self {
        Self {
            session_id,
            started_at: Utc::now(),
            active: true,
            transcript_segments: 0,
            transcript_len: 0,
            processed_cursor: 0,
            fields_count: 0,
            extractions_run: 0,
            extractions_failed: 0,
            extractions_timed_out: 0,
            handoffs: 0,
        }
    }
}
