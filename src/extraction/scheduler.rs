use std::time::Duration;
use tracing::debug;

use crate::config::ExtractionConfig;
use crate::fields::FieldStore;
use crate::transcript::TranscriptBuffer;

use super::prompt::build_prompt;

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Time between ticks
    pub interval: Duration,
    /// Safety timeout for a single generation call
    pub timeout: Duration,
    /// Minimum trimmed delta length (chars) worth an extraction call
    pub min_delta_chars: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            timeout: Duration::from_secs(15),
            min_delta_chars: 10,
        }
    }
}

impl From<&ExtractionConfig> for SchedulerConfig {
    fn from(config: &ExtractionConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.interval_secs.max(1)),
            timeout: Duration::from_secs(config.timeout_secs.max(1)),
            min_delta_chars: config.min_delta_chars,
        }
    }
}

/// Why a tick did not start an extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoTemplate,
    InsufficientDelta,
    InFlight,
}

/// A generation call the session should issue
#[derive(Debug, Clone)]
pub struct ExtractionJob {
    /// Identifies this call; results carrying any other ticket are stale
    pub ticket: u64,
    pub prompt: String,
    /// Buffer end (`TranscriptBuffer::end_offset`) when the call was issued; the
    /// cursor advances here on success
    pub cursor_target: usize,
    /// Field-store epoch when the call was issued
    pub epoch: u64,
}

#[derive(Debug)]
pub enum TickDecision {
    Skip(SkipReason),
    Run(ExtractionJob),
}

/// Decides, once per tick, whether to run an extraction
///
/// Guards are evaluated in order and short-circuit: template available, delta long
/// enough, nothing already in flight. At most one job is outstanding at a time.
#[derive(Debug)]
pub struct ExtractionScheduler {
    config: SchedulerConfig,
    in_flight: Option<u64>,
    next_ticket: u64,
}

impl ExtractionScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            in_flight: None,
            next_ticket: 1,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Evaluate the guards and, if they all pass, mark a new job in flight
    pub fn evaluate(&mut self, store: &mut FieldStore, buffer: &TranscriptBuffer) -> TickDecision {
        if !store.ensure_template() {
            return self.skip(SkipReason::NoTemplate);
        }

        let delta = buffer.delta();
        if delta.trim().chars().count() < self.config.min_delta_chars {
            return self.skip(SkipReason::InsufficientDelta);
        }

        if self.in_flight.is_some() {
            return self.skip(SkipReason::InFlight);
        }

        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.in_flight = Some(ticket);

        let prompt = build_prompt(store.template(), store.fields(), store.user_notes(), delta);
        debug!(
            "Extraction {} issued: {} delta chars, {} fields",
            ticket,
            delta.len(),
            store.template().len()
        );

        TickDecision::Run(ExtractionJob {
            ticket,
            prompt,
            cursor_target: buffer.end_offset(),
            epoch: store.epoch(),
        })
    }

    /// Clear the in-flight flag for `ticket`
    ///
    /// Returns false if `ticket` is not the outstanding job, in which case the
    /// caller must discard the result.
    pub fn complete(&mut self, ticket: u64) -> bool {
        if self.in_flight == Some(ticket) {
            self.in_flight = None;
            true
        } else {
            false
        }
    }

    fn skip(&self, reason: SkipReason) -> TickDecision {
        debug!("Extraction tick skipped: {:?}", reason);
        TickDecision::Skip(reason)
    }
}
