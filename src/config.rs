use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

/// Environment variable prefix (`FIELD_SCRIBE__EXTRACTION__API_KEY`, ...)
const ENV_PREFIX: &str = "FIELD_SCRIBE";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub transcription: TranscriptionConfig,
    pub extraction: ExtractionConfig,
    pub transcript: TranscriptConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
    /// Directory served as a fallback for non-API paths (the client UI)
    pub static_dir: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptionConfig {
    pub url: String,
    pub api_key: String,
    pub model: String,
    pub language: String,
    pub encoding: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub diarize: bool,
    pub smart_format: bool,
    pub interim_results: bool,
    /// Age after which the upstream connection is replaced on the next audio frame
    pub handoff_after_secs: u64,
    pub keepalive_secs: u64,
}

impl TranscriptionConfig {
    pub fn handoff_after(&self) -> Duration {
        Duration::from_secs(self.handoff_after_secs)
    }

    pub fn keepalive(&self) -> Duration {
        Duration::from_secs(self.keepalive_secs.max(1))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub interval_secs: u64,
    pub timeout_secs: u64,
    pub min_delta_chars: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptConfig {
    pub trim_threshold: usize,
    pub keep_suffix: usize,
}

impl Config {
    /// Load configuration from built-in defaults, an optional file and the environment.
    ///
    /// `path` is passed to `config::File::with_name`, so the extension may be omitted.
    /// A missing file is not an error.
    pub fn load(path: &str) -> Result<Self> {
        let settings = Self::builder()?
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .with_context(|| format!("Failed to build configuration from {}", path))?;

        settings
            .try_deserialize()
            .context("Invalid configuration")
    }

    /// Defaults only, ignoring files and environment
    pub fn defaults() -> Result<Self> {
        Ok(Self::builder()?.build()?.try_deserialize()?)
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        let builder = config::Config::builder()
            .set_default("service.name", "field-scribe")?
            .set_default("service.http.bind", "0.0.0.0")?
            .set_default("service.http.port", 3000)?
            .set_default("transcription.url", "wss://api.deepgram.com/v1/listen")?
            .set_default("transcription.api_key", "")?
            .set_default("transcription.model", "nova-2")?
            .set_default("transcription.language", "en-US")?
            .set_default("transcription.encoding", "linear16")?
            .set_default("transcription.sample_rate", 16000)?
            .set_default("transcription.channels", 1)?
            .set_default("transcription.diarize", true)?
            .set_default("transcription.smart_format", true)?
            .set_default("transcription.interim_results", false)?
            .set_default("transcription.handoff_after_secs", 55 * 60)?
            .set_default("transcription.keepalive_secs", 8)?
            .set_default("extraction.base_url", "https://api.openai.com/v1")?
            .set_default("extraction.api_key", "")?
            .set_default("extraction.model", "gpt-4o-mini")?
            .set_default("extraction.temperature", 0.1)?
            .set_default("extraction.interval_secs", 10)?
            .set_default("extraction.timeout_secs", 15)?
            .set_default("extraction.min_delta_chars", 10)?
            .set_default("transcript.trim_threshold", 50_000)?
            .set_default("transcript.keep_suffix", 40_000)?;

        Ok(builder)
    }
}
