//! Upstream streaming speech recognition
//!
//! - `messages`: wire types of the live-listen protocol and the events handed to the session
//! - `client`: WebSocket connection to the recognition service
//! - `adapter`: owns the current upstream handle and renews it before the service's
//!   session-duration limit

mod adapter;
mod client;
pub mod messages;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

pub use adapter::TranscriptionAdapter;
pub use client::{DeepgramConnector, DeepgramStream};
pub use messages::{ListenResponse, TranscriptionEvent};

/// Opens upstream transcription streams
///
/// Each stream delivers its events on `events` until it is closed. Streams of one
/// session share that channel, so a stream tags its `Closed` event with the
/// `generation` it was opened with.
#[async_trait]
pub trait TranscriptionConnector: Send + Sync {
    async fn connect(
        &self,
        generation: u64,
        events: mpsc::Sender<TranscriptionEvent>,
    ) -> Result<Box<dyn TranscriptionStream>>;
}

/// A live upstream stream
#[async_trait]
pub trait TranscriptionStream: Send + Sync {
    /// Forward one frame of 16-bit linear PCM
    async fn send_audio(&mut self, frame: Vec<u8>) -> Result<()>;

    /// Ask the service to finish and close the connection
    async fn close(&mut self) -> Result<()>;
}
