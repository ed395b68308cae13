pub mod config;
pub mod extraction;
pub mod fields;
pub mod http;
pub mod session;
pub mod transcript;
pub mod transcription;

pub use config::Config;
pub use extraction::{ExtractionScheduler, Generator, GenerationError, HttpGenerator};
pub use fields::{apply_updates, ClientState, ExtractionUpdate, Field, FieldDescriptor, FieldStore, UpdateAction};
pub use http::{create_router, AppState};
pub use session::{ClientFrame, ServerMessage, Session, SessionConfig, SessionStats};
pub use transcript::TranscriptBuffer;
pub use transcription::{
    DeepgramConnector, TranscriptionAdapter, TranscriptionConnector, TranscriptionEvent,
    TranscriptionStream,
};
