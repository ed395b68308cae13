use serde::{Deserialize, Serialize};

/// Event delivered from an upstream stream to the session
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptionEvent {
    /// A finalized (non-interim) transcript
    Final { speaker: u32, text: String },
    /// The upstream reported an error; the stream may still be usable
    Error(String),
    /// The upstream connection with this generation ended
    Closed { generation: u64 },
}

impl TranscriptionEvent {
    /// `[Speaker N] text` rendering used in the transcript buffer and sent to the client
    pub fn labeled_text(&self) -> Option<String> {
        match self {
            TranscriptionEvent::Final { speaker, text } => {
                Some(format!("[Speaker {}] {}", speaker, text))
            }
            _ => None,
        }
    }
}

/// Inbound text frame of the live-listen protocol
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ListenResponse {
    Results(ListenResults),
    Metadata {
        #[serde(default)]
        request_id: Option<String>,
    },
    UtteranceEnd {},
    SpeechStarted {},
    Error {
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        message: Option<String>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListenResults {
    #[serde(default)]
    pub is_final: bool,
    #[serde(default)]
    pub speech_final: bool,
    pub channel: ListenChannel,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListenChannel {
    #[serde(default)]
    pub alternatives: Vec<Alternative>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Alternative {
    #[serde(default)]
    pub transcript: String,
    #[serde(default)]
    pub confidence: Option<f32>,
    #[serde(default)]
    pub words: Vec<Word>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Word {
    #[serde(default)]
    pub word: String,
    #[serde(default)]
    pub speaker: Option<u32>,
}

impl ListenResponse {
    /// Convert to a session event
    ///
    /// Interim results, empty transcripts and bookkeeping frames yield `None`.
    /// The speaker label comes from the first word's speaker tag (0 if absent).
    pub fn into_event(self) -> Option<TranscriptionEvent> {
        match self {
            ListenResponse::Results(results) => {
                if !results.is_final {
                    return None;
                }
                let alternative = results.channel.alternatives.into_iter().next()?;
                let text = alternative.transcript.trim();
                if text.is_empty() {
                    return None;
                }
                let speaker = alternative
                    .words
                    .first()
                    .and_then(|w| w.speaker)
                    .unwrap_or(0);
                Some(TranscriptionEvent::Final {
                    speaker,
                    text: text.to_string(),
                })
            }
            ListenResponse::Error {
                description,
                message,
            } => Some(TranscriptionEvent::Error(
                description
                    .or(message)
                    .unwrap_or_else(|| "unknown upstream error".to_string()),
            )),
            _ => None,
        }
    }
}

/// Outbound control frame of the live-listen protocol
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ListenControl {
    KeepAlive,
    CloseStream,
}
