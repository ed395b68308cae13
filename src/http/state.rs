use crate::config::Config;
use crate::extraction::Generator;
use crate::session::SessionStats;
use crate::transcription::TranscriptionConnector;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,

    /// Opens upstream transcription streams for new sessions
    pub connector: Arc<dyn TranscriptionConnector>,

    /// Text-generation collaborator shared by all sessions
    pub generator: Arc<dyn Generator>,

    /// Active sessions (session_id → live stats)
    pub sessions: Arc<RwLock<HashMap<String, watch::Receiver<SessionStats>>>>,
}

impl AppState {
    pub fn new(
        config: Config,
        connector: Arc<dyn TranscriptionConnector>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            connector,
            generator,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}
