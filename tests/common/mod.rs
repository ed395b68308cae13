// Test doubles for the external collaborators: the upstream transcription
// service and the text-generation service.

#![allow(dead_code)]

use anyhow::{bail, Result};
use async_trait::async_trait;
use field_scribe::{GenerationError, Generator, TranscriptionConnector, TranscriptionEvent, TranscriptionStream};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// Records connects, forwarded frames and closes; hands the event sender to the test
#[derive(Default)]
pub struct FakeConnector {
    pub connects: AtomicUsize,
    pub fail: AtomicBool,
    pub events: Mutex<Option<mpsc::Sender<TranscriptionEvent>>>,
    pub generations: Mutex<Vec<u64>>,
    pub frames: Arc<Mutex<Vec<Vec<u8>>>>,
    pub closes: Arc<AtomicUsize>,
}

impl FakeConnector {
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn frame_count(&self) -> usize {
        self.frames.lock().unwrap().len()
    }

    /// Generation passed to the most recent connect
    pub fn last_generation(&self) -> Option<u64> {
        self.generations.lock().unwrap().last().copied()
    }

    pub fn events(&self) -> Option<mpsc::Sender<TranscriptionEvent>> {
        self.events.lock().unwrap().clone()
    }

    /// Yield until the session under test has opened a stream
    pub async fn wait_for_stream(&self) -> mpsc::Sender<TranscriptionEvent> {
        loop {
            if let Some(events) = self.events() {
                return events;
            }
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl TranscriptionConnector for FakeConnector {
    async fn connect(
        &self,
        generation: u64,
        events: mpsc::Sender<TranscriptionEvent>,
    ) -> Result<Box<dyn TranscriptionStream>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.generations.lock().unwrap().push(generation);
        if self.fail.load(Ordering::SeqCst) {
            bail!("connection refused");
        }
        *self.events.lock().unwrap() = Some(events);
        Ok(Box::new(FakeStream {
            frames: Arc::clone(&self.frames),
            closes: Arc::clone(&self.closes),
        }))
    }
}

pub struct FakeStream {
    frames: Arc<Mutex<Vec<Vec<u8>>>>,
    closes: Arc<AtomicUsize>,
}

#[async_trait]
impl TranscriptionStream for FakeStream {
    async fn send_audio(&mut self, frame: Vec<u8>) -> Result<()> {
        self.frames.lock().unwrap().push(frame);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Replies from a queue (falling back to an empty update list), optionally after a delay
#[derive(Default)]
pub struct FakeGenerator {
    pub responses: Mutex<VecDeque<Result<String, GenerationError>>>,
    pub prompts: Mutex<Vec<String>>,
    pub delay: Mutex<Option<Duration>>,
}

impl FakeGenerator {
    pub fn with_responses(responses: Vec<Result<String, GenerationError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            ..Default::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Generator for FakeGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(r#"{"updates":[]}"#.to_string()))
    }
}
