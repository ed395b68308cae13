use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, timeout, Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

use super::messages::{ListenControl, ListenResponse, TranscriptionEvent};
use super::{TranscriptionConnector, TranscriptionStream};
use crate::config::TranscriptionConfig;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Timeout for the WebSocket handshake
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// How long a closed stream may keep delivering trailing results
const CLOSE_GRACE: Duration = Duration::from_secs(5);

/// Outgoing frames queued per stream
const OUTGOING_CAPACITY: usize = 256;

/// Connects to a Deepgram-compatible live-listen endpoint
pub struct DeepgramConnector {
    config: TranscriptionConfig,
}

impl DeepgramConnector {
    pub fn new(config: TranscriptionConfig) -> Self {
        Self { config }
    }

    /// Listen URL with the stream configuration as query parameters
    pub fn listen_url(&self) -> Result<reqwest::Url> {
        let c = &self.config;
        let sample_rate = c.sample_rate.to_string();
        let channels = c.channels.to_string();
        reqwest::Url::parse_with_params(
            &c.url,
            &[
                ("model", c.model.as_str()),
                ("language", c.language.as_str()),
                ("encoding", c.encoding.as_str()),
                ("sample_rate", sample_rate.as_str()),
                ("channels", channels.as_str()),
                ("diarize", bool_param(c.diarize)),
                ("smart_format", bool_param(c.smart_format)),
                ("interim_results", bool_param(c.interim_results)),
            ],
        )
        .with_context(|| format!("Invalid transcription url: {}", c.url))
    }
}

fn bool_param(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

#[async_trait]
impl TranscriptionConnector for DeepgramConnector {
    async fn connect(
        &self,
        generation: u64,
        events: mpsc::Sender<TranscriptionEvent>,
    ) -> Result<Box<dyn TranscriptionStream>> {
        let url = self.listen_url()?;

        let mut request = url
            .as_str()
            .into_client_request()
            .context("Failed to build transcription request")?;
        request.headers_mut().insert(
            "Authorization",
            HeaderValue::from_str(&format!("Token {}", self.config.api_key))
                .context("Invalid transcription API key")?,
        );

        info!(
            "Connecting to transcription service at {} (generation {})",
            self.config.url, generation
        );

        let (ws, _response) = timeout(CONNECT_TIMEOUT, connect_async(request))
            .await
            .map_err(|_| anyhow!("Transcription connection timed out"))?
            .context("Failed to connect to transcription service")?;

        info!("Transcription stream connected");

        let (sink, stream) = ws.split();
        let (outgoing_tx, outgoing_rx) = mpsc::channel(OUTGOING_CAPACITY);
        let closing = Arc::new(AtomicBool::new(false));

        let writer = tokio::spawn(run_writer(sink, outgoing_rx, self.config.keepalive()));
        let reader = tokio::spawn(run_reader(stream, generation, events, Arc::clone(&closing)));

        Ok(Box::new(DeepgramStream {
            outgoing: Some(outgoing_tx),
            closing,
            writer,
            reader,
        }))
    }
}

/// Handle to one live upstream connection
pub struct DeepgramStream {
    outgoing: Option<mpsc::Sender<Message>>,
    closing: Arc<AtomicBool>,
    writer: JoinHandle<()>,
    reader: JoinHandle<()>,
}

#[async_trait]
impl TranscriptionStream for DeepgramStream {
    async fn send_audio(&mut self, frame: Vec<u8>) -> Result<()> {
        let outgoing = self
            .outgoing
            .as_ref()
            .ok_or_else(|| anyhow!("Transcription stream already closed"))?;

        outgoing
            .send(Message::Binary(frame))
            .await
            .map_err(|_| anyhow!("Transcription stream writer has stopped"))
    }

    async fn close(&mut self) -> Result<()> {
        let Some(outgoing) = self.outgoing.take() else {
            return Ok(());
        };
        self.closing.store(true, Ordering::SeqCst);

        let close = serde_json::to_string(&ListenControl::CloseStream)?;
        if outgoing.send(Message::Text(close)).await.is_err() {
            debug!("Writer already gone while closing transcription stream");
        }
        // Dropping the sender lets the writer close the socket

        let reader = self.reader.abort_handle();
        tokio::spawn(async move {
            tokio::time::sleep(CLOSE_GRACE).await;
            reader.abort();
        });

        Ok(())
    }
}

impl Drop for DeepgramStream {
    fn drop(&mut self) {
        if !self.closing.load(Ordering::SeqCst) {
            self.writer.abort();
            self.reader.abort();
        }
    }
}

async fn run_writer(
    mut sink: SplitSink<WsStream, Message>,
    mut outgoing: mpsc::Receiver<Message>,
    keepalive: Duration,
) {
    let mut ticker = interval_at(Instant::now() + keepalive, keepalive);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            message = outgoing.recv() => match message {
                Some(message) => {
                    if let Err(e) = sink.send(message).await {
                        warn!("Failed to send to transcription service: {}", e);
                        break;
                    }
                    ticker.reset();
                }
                None => {
                    if let Err(e) = sink.close().await {
                        debug!("Error closing transcription socket: {}", e);
                    }
                    break;
                }
            },
            _ = ticker.tick() => {
                let Ok(keepalive) = serde_json::to_string(&ListenControl::KeepAlive) else {
                    continue;
                };
                if let Err(e) = sink.send(Message::Text(keepalive)).await {
                    warn!("Failed to send keep-alive: {}", e);
                    break;
                }
            }
        }
    }

    debug!("Transcription writer task stopped");
}

async fn run_reader(
    mut stream: SplitStream<WsStream>,
    generation: u64,
    events: mpsc::Sender<TranscriptionEvent>,
    closing: Arc<AtomicBool>,
) {
    while let Some(message) = stream.next().await {
        let event = match message {
            Ok(Message::Text(text)) => match serde_json::from_str::<ListenResponse>(&text) {
                Ok(response) => response.into_event(),
                Err(e) => {
                    warn!("Failed to parse transcription message: {}", e);
                    None
                }
            },
            Ok(Message::Close(frame)) => {
                info!("Transcription service closed the stream: {:?}", frame);
                break;
            }
            Ok(_) => None,
            Err(e) => {
                error!("Transcription stream error: {}", e);
                let _ = events.send(TranscriptionEvent::Error(e.to_string())).await;
                break;
            }
        };

        if let Some(event) = event {
            if events.send(event).await.is_err() {
                debug!("Session gone, stopping transcription reader");
                return;
            }
        }
    }

    if !closing.load(Ordering::SeqCst) {
        let _ = events.send(TranscriptionEvent::Closed { generation }).await;
    }
    debug!("Transcription reader task stopped");
}
