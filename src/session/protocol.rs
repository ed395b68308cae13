//! Client wire protocol
//!
//! Inbound: binary PCM audio frames, `updateTemplate:<json array>` text commands,
//! and `{"type":"contextUpdate",...}` JSON. Outbound: JSON objects tagged by `type`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::fields::{ClientState, Field, FieldDescriptor};

const TEMPLATE_PREFIX: &str = "updateTemplate:";

/// One frame received from the client, as framed by the transport
#[derive(Debug, Clone, PartialEq)]
pub enum ClientFrame {
    Text(String),
    Binary(Vec<u8>),
}

/// What a client frame means to the session
#[derive(Debug, Clone, PartialEq)]
pub enum ClientCommand {
    Audio(Vec<u8>),
    SetTemplate(Vec<FieldDescriptor>),
    SyncContext(ClientState),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum JsonCommand {
    #[serde(rename_all = "camelCase")]
    ContextUpdate {
        #[serde(default)]
        fields: Vec<Field>,
        #[serde(default)]
        user_notes: String,
    },
}

impl ClientFrame {
    /// Interpret the frame; `None` for anything malformed or unknown
    ///
    /// The transport's frame type decides first: text frames are control messages,
    /// binary frames are audio. A binary frame is only read as a control message when
    /// it starts like one (`{` or `updateTemplate:`) and parses as one, for clients
    /// that send everything as binary.
    pub fn into_command(self) -> Option<ClientCommand> {
        match self {
            ClientFrame::Text(text) => parse_control(&text),
            ClientFrame::Binary(bytes) => {
                if looks_like_control(&bytes) {
                    if let Some(command) = std::str::from_utf8(&bytes).ok().and_then(parse_control)
                    {
                        return Some(command);
                    }
                }
                Some(ClientCommand::Audio(bytes))
            }
        }
    }
}

fn looks_like_control(bytes: &[u8]) -> bool {
    bytes.first() == Some(&b'{') || bytes.starts_with(TEMPLATE_PREFIX.as_bytes())
}

/// Parse a text control message
pub fn parse_control(text: &str) -> Option<ClientCommand> {
    if let Some(json) = text.strip_prefix(TEMPLATE_PREFIX) {
        let template: Vec<FieldDescriptor> = serde_json::from_str(json).ok()?;
        return Some(ClientCommand::SetTemplate(template));
    }

    match serde_json::from_str::<JsonCommand>(text).ok()? {
        JsonCommand::ContextUpdate { fields, user_notes } => {
            Some(ClientCommand::SyncContext(ClientState { fields, user_notes }))
        }
    }
}

/// Message sent to the client
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Extraction call in progress (`true`) or idle
    Status { active: bool },
    Transcript {
        text: String,
        #[serde(rename = "isFinal")]
        is_final: bool,
    },
    /// Consolidated field values after a merge that changed something
    TemplateUpdate { data: BTreeMap<String, String> },
    Error { message: String },
}

impl ServerMessage {
    pub fn transcript(text: impl Into<String>) -> Self {
        ServerMessage::Transcript {
            text: text.into(),
            is_final: true,
        }
    }
}
