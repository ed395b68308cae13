use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::Config;
use crate::extraction::SchedulerConfig;
use crate::transcript::{DEFAULT_KEEP_SUFFIX, DEFAULT_TRIM_THRESHOLD};

/// Configuration for one client session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Unique session identifier
    pub session_id: String,

    /// Time between extraction ticks
    /// Default: 10 seconds
    pub extraction_interval: Duration,

    /// Safety timeout for one generation call
    /// Default: 15 seconds
    pub extraction_timeout: Duration,

    /// Minimum unprocessed transcript (chars, trimmed) worth extracting from
    pub min_delta_chars: usize,

    /// Transcript buffer trim threshold and kept suffix (bytes)
    pub transcript_trim_threshold: usize,
    pub transcript_keep_suffix: usize,

    /// Upstream stream age that triggers a handoff
    /// Default: 55 minutes (the service limit is about 60)
    pub handoff_after: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: format!("session-{}", uuid::Uuid::new_v4()),
            extraction_interval: Duration::from_secs(10),
            extraction_timeout: Duration::from_secs(15),
            min_delta_chars: 10,
            transcript_trim_threshold: DEFAULT_TRIM_THRESHOLD,
            transcript_keep_suffix: DEFAULT_KEEP_SUFFIX,
            handoff_after: Duration::from_secs(55 * 60),
        }
    }
}

impl SessionConfig {
    /// Session settings derived from the service configuration, with a fresh id
    pub fn from_config(config: &Config) -> Self {
        let scheduler = SchedulerConfig::from(&config.extraction);
        Self {
            session_id: format!("session-{}", uuid::Uuid::new_v4()),
            extraction_interval: scheduler.interval,
            extraction_timeout: scheduler.timeout,
            min_delta_chars: scheduler.min_delta_chars,
            transcript_trim_threshold: config.transcript.trim_threshold,
            transcript_keep_suffix: config.transcript.keep_suffix,
            handoff_after: config.transcription.handoff_after(),
        }
    }

    pub fn scheduler(&self) -> SchedulerConfig {
        SchedulerConfig {
            interval: self.extraction_interval,
            timeout: self.extraction_timeout,
            min_delta_chars: self.min_delta_chars,
        }
    }
}
