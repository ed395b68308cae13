//! HTTP server
//!
//! - GET /ws - Client WebSocket (binary PCM in, JSON status/transcript/field updates out)
//! - GET /sessions - Stats for all active sessions
//! - GET /sessions/:id - Stats for one session
//! - GET /health - Health check
//!
//! When `service.http.static_dir` is set, other paths are served from that directory.

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
