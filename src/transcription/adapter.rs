use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::messages::TranscriptionEvent;
use super::{TranscriptionConnector, TranscriptionStream};

/// Owns the session's upstream transcription stream
///
/// The recognition service caps a streaming session at roughly an hour. Before
/// forwarding each audio frame the adapter checks the stream's age and, past
/// `handoff_after` (or with no live stream at all), closes the old stream and opens
/// a fresh one with the same configuration.
///
/// Frames arriving while a replacement connect is failing are dropped; the next
/// frame retries. The connect is awaited on the caller's task, so a handoff or
/// reconnect holds up the session loop (ticks, extraction results, further frames)
/// for up to the connect timeout. Frames queue in the inbound channel meanwhile.
///
/// Every connect gets a new generation. A `Closed` event only tears down the live
/// stream when it carries the live stream's generation.
pub struct TranscriptionAdapter {
    connector: Arc<dyn TranscriptionConnector>,
    events: mpsc::Sender<TranscriptionEvent>,
    stream: Option<Box<dyn TranscriptionStream>>,
    /// Generation of the latest connect attempt
    generation: u64,
    connected_at: Option<Instant>,
    handoff_after: Duration,
    handoffs: u64,
}

impl TranscriptionAdapter {
    pub fn new(
        connector: Arc<dyn TranscriptionConnector>,
        events: mpsc::Sender<TranscriptionEvent>,
        handoff_after: Duration,
    ) -> Self {
        Self {
            connector,
            events,
            stream: None,
            generation: 0,
            connected_at: None,
            handoff_after,
            handoffs: 0,
        }
    }

    /// Forward one audio frame, (re)connecting first if needed
    ///
    /// Upstream failures are logged and never returned; the session carries on.
    pub async fn forward_audio(&mut self, frame: Vec<u8>) {
        if self.needs_handoff() {
            self.handoff().await;
        }

        let Some(stream) = self.stream.as_mut() else {
            return;
        };

        if let Err(e) = stream.send_audio(frame).await {
            error!("Failed to forward audio upstream: {:#}", e);
            self.mark_disconnected();
        }
    }

    /// True when no stream is live or the live one is older than the renewal age
    pub fn needs_handoff(&self) -> bool {
        match (&self.stream, self.connected_at) {
            (Some(_), Some(connected_at)) => connected_at.elapsed() > self.handoff_after,
            _ => true,
        }
    }

    /// Forget the current stream without closing it (it is already gone)
    pub fn mark_disconnected(&mut self) {
        if self.stream.take().is_some() {
            warn!("Upstream transcription stream lost; will reconnect on next audio frame");
        }
        self.connected_at = None;
    }

    /// Handle a `Closed` event; events from replaced streams are ignored
    pub fn stream_closed(&mut self, generation: u64) {
        if generation == self.generation {
            self.mark_disconnected();
        } else {
            debug!(
                "Ignoring close of replaced stream {} (live generation {})",
                generation, self.generation
            );
        }
    }

    /// Generation of the latest connect attempt (0 before the first)
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Number of renewals of an existing stream (initial connects excluded)
    pub fn handoff_count(&self) -> u64 {
        self.handoffs
    }

    /// Close the current stream, if any
    pub async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.close().await {
                warn!("Error closing transcription stream: {:#}", e);
            }
        }
        self.connected_at = None;
    }

    async fn handoff(&mut self) {
        let renewing = self.stream.is_some();
        if renewing {
            info!(
                "Transcription stream older than {:?}, handing off to a new connection",
                self.handoff_after
            );
        }
        self.close().await;

        match self.open().await {
            Ok(stream) => {
                self.stream = Some(stream);
                self.connected_at = Some(Instant::now());
                if renewing {
                    self.handoffs += 1;
                }
            }
            Err(e) => {
                error!("Failed to open transcription stream: {:#}", e);
            }
        }
    }

    async fn open(&mut self) -> Result<Box<dyn TranscriptionStream>> {
        self.generation += 1;
        self.connector
            .connect(self.generation, self.events.clone())
            .await
    }
}
