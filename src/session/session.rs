use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, timeout, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::config::SessionConfig;
use super::protocol::{ClientCommand, ClientFrame, ServerMessage};
use super::stats::SessionStats;
use crate::extraction::{parse_updates, ExtractionJob, ExtractionScheduler, Generator, TickDecision};
use crate::fields::{apply_updates, FieldStore, StoreChange};
use crate::transcript::TranscriptBuffer;
use crate::transcription::{TranscriptionAdapter, TranscriptionConnector, TranscriptionEvent};

/// Upstream transcription events queued per session
const TRANSCRIPTION_EVENT_CAPACITY: usize = 100;

/// How a generation call ended
#[derive(Debug)]
enum ExtractionOutcome {
    Completed(String),
    Failed(String),
    TimedOut,
}

#[derive(Debug)]
struct ExtractionDone {
    ticket: u64,
    cursor_target: usize,
    epoch: u64,
    outcome: ExtractionOutcome,
}

/// State for one client connection
///
/// All handlers run on the session's own task, one at a time. The only concurrent
/// work is the generation call, which runs on a spawned task and reports back
/// through a channel; the scheduler's in-flight ticket keeps it to one call at a time.
pub struct Session {
    config: SessionConfig,
    buffer: TranscriptBuffer,
    store: FieldStore,
    scheduler: ExtractionScheduler,
    adapter: TranscriptionAdapter,
    generator: Arc<dyn Generator>,

    /// Messages for the client
    outbound: mpsc::Sender<ServerMessage>,

    transcription_rx: mpsc::Receiver<TranscriptionEvent>,
    extraction_tx: mpsc::Sender<ExtractionDone>,
    extraction_rx: mpsc::Receiver<ExtractionDone>,

    /// Cancelled on teardown; checked by in-flight generation calls
    cancel: CancellationToken,
    closed: bool,

    stats: SessionStats,
    stats_tx: watch::Sender<SessionStats>,
}

impl Session {
    pub fn new(
        config: SessionConfig,
        connector: Arc<dyn TranscriptionConnector>,
        generator: Arc<dyn Generator>,
        outbound: mpsc::Sender<ServerMessage>,
    ) -> Self {
        info!("Creating session: {}", config.session_id);

        let (transcription_tx, transcription_rx) = mpsc::channel(TRANSCRIPTION_EVENT_CAPACITY);
        let (extraction_tx, extraction_rx) = mpsc::channel(4);

        let stats = SessionStats::new(config.session_id.clone());
        let (stats_tx, _) = watch::channel(stats.clone());

        Self {
            buffer: TranscriptBuffer::new(
                config.transcript_trim_threshold,
                config.transcript_keep_suffix,
            ),
            store: FieldStore::new(),
            scheduler: ExtractionScheduler::new(config.scheduler()),
            adapter: TranscriptionAdapter::new(connector, transcription_tx, config.handoff_after),
            generator,
            outbound,
            transcription_rx,
            extraction_tx,
            extraction_rx,
            cancel: CancellationToken::new(),
            closed: false,
            stats,
            stats_tx,
            config,
        }
    }

    pub fn id(&self) -> &str {
        &self.config.session_id
    }

    /// Live view of the session's statistics
    pub fn subscribe_stats(&self) -> watch::Receiver<SessionStats> {
        self.stats_tx.subscribe()
    }

    /// Token that tears the session down when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn buffer(&self) -> &TranscriptBuffer {
        &self.buffer
    }

    pub fn store(&self) -> &FieldStore {
        &self.store
    }

    pub fn is_extraction_in_flight(&self) -> bool {
        self.scheduler.is_in_flight()
    }

    /// Drive the session until the client goes away or the token is cancelled
    ///
    /// Returns the final statistics after teardown.
    pub async fn run(mut self, mut inbound: mpsc::Receiver<ClientFrame>) -> SessionStats {
        info!("Session started: {}", self.config.session_id);

        let period = self.config.extraction_interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                frame = inbound.recv() => match frame {
                    Some(frame) => self.handle_frame(frame).await,
                    None => break,
                },
                Some(event) = self.transcription_rx.recv() => {
                    self.handle_transcription_event(event).await;
                }
                Some(done) = self.extraction_rx.recv() => self.finish_extraction(done).await,
                _ = ticker.tick() => self.tick().await,
            }
        }

        self.shutdown().await
    }

    /// Apply one frame from the client
    pub async fn handle_frame(&mut self, frame: ClientFrame) {
        let Some(command) = frame.into_command() else {
            debug!("Ignoring malformed client message");
            return;
        };

        match command {
            ClientCommand::Audio(pcm) => {
                self.adapter.forward_audio(pcm).await;
                self.stats.handoffs = self.adapter.handoff_count();
            }
            ClientCommand::SetTemplate(template) => {
                let change = self.store.set_template(template);
                self.apply_store_change(change);
            }
            ClientCommand::SyncContext(state) => {
                let change = self.store.sync_context(state);
                self.apply_store_change(change);
            }
        }
    }

    /// Apply one event from the upstream transcription stream
    pub async fn handle_transcription_event(&mut self, event: TranscriptionEvent) {
        match event {
            TranscriptionEvent::Final { .. } => {
                let Some(labeled) = event.labeled_text() else {
                    return;
                };
                self.buffer.append(&labeled);
                self.publish_stats();
                notify(&self.outbound, ServerMessage::transcript(labeled)).await;
            }
            TranscriptionEvent::Error(message) => {
                error!("Upstream transcription error: {}", message);
            }
            TranscriptionEvent::Closed { generation } => {
                self.adapter.stream_closed(generation);
            }
        }
    }

    /// One scheduler tick: maybe start an extraction
    pub async fn tick(&mut self) {
        if self.closed {
            return;
        }

        let job = match self.scheduler.evaluate(&mut self.store, &self.buffer) {
            TickDecision::Skip(_) => return,
            TickDecision::Run(job) => job,
        };

        self.stats.extractions_run += 1;
        notify(&self.outbound, ServerMessage::Status { active: true }).await;
        self.spawn_extraction(job);
    }

    fn spawn_extraction(&self, job: ExtractionJob) {
        let generator = Arc::clone(&self.generator);
        let done_tx = self.extraction_tx.clone();
        let cancel = self.cancel.clone();
        let limit = self.scheduler.config().timeout;

        tokio::spawn(async move {
            let ExtractionJob {
                ticket,
                prompt,
                cursor_target,
                epoch,
            } = job;

            let outcome = tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Session closed; dropping extraction {}", ticket);
                    return;
                }
                result = timeout(limit, generator.generate(&prompt)) => match result {
                    Ok(Ok(text)) => ExtractionOutcome::Completed(text),
                    Ok(Err(e)) => ExtractionOutcome::Failed(e.to_string()),
                    Err(_) => ExtractionOutcome::TimedOut,
                },
            };

            let done = ExtractionDone {
                ticket,
                cursor_target,
                epoch,
                outcome,
            };
            if done_tx.send(done).await.is_err() {
                debug!("Session gone before extraction {} finished", ticket);
            }
        });
    }

    async fn finish_extraction(&mut self, done: ExtractionDone) {
        if self.closed {
            debug!("Discarding extraction {} after teardown", done.ticket);
            return;
        }
        if !self.scheduler.complete(done.ticket) {
            debug!("Discarding stale extraction result {}", done.ticket);
            return;
        }

        match done.outcome {
            ExtractionOutcome::Completed(raw) => {
                let updates = parse_updates(&raw).unwrap_or_else(|| {
                    warn!("Generation output was not parsable; treating as no updates");
                    Vec::new()
                });

                if done.epoch == self.store.epoch() {
                    self.buffer.mark_processed_through(done.cursor_target);
                } else {
                    info!("Field set changed during extraction; transcript will be re-scanned");
                }

                let report = apply_updates(self.store.fields_mut(), &updates);
                if report.has_changes() {
                    info!(
                        "Extraction {} updated {} field(s): {:?}",
                        done.ticket,
                        report.changed.len(),
                        report.changed
                    );
                    let data = self.store.values();
                    notify(&self.outbound, ServerMessage::TemplateUpdate { data }).await;
                } else {
                    debug!(
                        "Extraction {} changed nothing ({} updates, {} duplicates, {} unknown)",
                        done.ticket,
                        updates.len(),
                        report.duplicates,
                        report.unknown
                    );
                }
            }
            ExtractionOutcome::Failed(message) => {
                error!("Extraction {} failed: {}", done.ticket, message);
                self.stats.extractions_failed += 1;
                notify(&self.outbound, ServerMessage::Error { message }).await;
            }
            ExtractionOutcome::TimedOut => {
                warn!(
                    "Extraction {} exceeded {:?}; clearing in-flight flag",
                    done.ticket,
                    self.scheduler.config().timeout
                );
                self.stats.extractions_timed_out += 1;
            }
        }

        notify(&self.outbound, ServerMessage::Status { active: false }).await;
        self.publish_stats();
    }

    fn apply_store_change(&mut self, change: StoreChange) {
        if change.field_set_changed {
            info!("Field set changed; resetting processed cursor");
            self.buffer.reset_cursor();
        }
        self.publish_stats();
    }

    fn publish_stats(&mut self) {
        self.stats.transcript_segments = self.buffer.segment_count();
        self.stats.transcript_len = self.buffer.len();
        self.stats.processed_cursor = self.buffer.processed_cursor();
        self.stats.fields_count = self.store.fields().len();
        self.stats_tx.send_replace(self.stats.clone());
    }

    async fn shutdown(mut self) -> SessionStats {
        info!("Stopping session: {}", self.config.session_id);

        self.closed = true;
        self.cancel.cancel();
        self.adapter.close().await;

        self.stats.active = false;
        self.publish_stats();

        info!("Session stopped: {}", self.config.session_id);
        self.stats
    }
}

async fn notify(outbound: &mpsc::Sender<ServerMessage>, message: ServerMessage) {
    if outbound.send(message).await.is_err() {
        debug!("Client channel closed; dropping outbound message");
    }
}
