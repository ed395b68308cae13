use super::state::AppState;
use crate::session::{ClientFrame, ServerMessage, Session, SessionConfig, SessionStats};
use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Client frames queued for the session task
const INBOUND_CAPACITY: usize = 256;

/// Server messages queued for the socket writer
const OUTBOUND_CAPACITY: usize = 64;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /ws
/// Upgrade to a WebSocket and run a session on it
pub async fn ws_handler(State(state): State<AppState>, upgrade: WebSocketUpgrade) -> impl IntoResponse {
    upgrade.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: AppState, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();

    let (out_tx, mut out_rx) = mpsc::channel::<ServerMessage>(OUTBOUND_CAPACITY);
    let (in_tx, in_rx) = mpsc::channel::<ClientFrame>(INBOUND_CAPACITY);

    let config = SessionConfig::from_config(&state.config);
    let session = Session::new(
        config,
        Arc::clone(&state.connector),
        Arc::clone(&state.generator),
        out_tx,
    );
    let session_id = session.id().to_string();
    let cancel = session.cancellation_token();

    {
        let mut sessions = state.sessions.write().await;
        sessions.insert(session_id.clone(), session.subscribe_stats());
    }
    info!("Client connected: {}", session_id);

    let send_task = tokio::spawn(async move {
        while let Some(message) = out_rx.recv().await {
            let payload = match serde_json::to_string(&message) {
                Ok(payload) => payload,
                Err(e) => {
                    error!("Failed to serialize client message: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(payload)).await.is_err() {
                break;
            }
        }
    });

    let session_task = tokio::spawn(session.run(in_rx));

    while let Some(message) = receiver.next().await {
        let frame = match message {
            Ok(Message::Binary(bytes)) => ClientFrame::Binary(bytes),
            Ok(Message::Text(text)) => ClientFrame::Text(text),
            Ok(Message::Close(_)) => break,
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => continue,
            Err(e) => {
                debug!("Client socket error on {}: {}", session_id, e);
                break;
            }
        };
        if in_tx.send(frame).await.is_err() {
            break;
        }
    }

    info!("Client disconnected: {}", session_id);

    drop(in_tx);
    cancel.cancel();
    match session_task.await {
        Ok(stats) => info!(
            "Session {} finished: {} segments, {} extractions ({} failed, {} timed out)",
            stats.session_id,
            stats.transcript_segments,
            stats.extractions_run,
            stats.extractions_failed,
            stats.extractions_timed_out
        ),
        Err(e) => error!("Session task panicked: {}", e),
    }
    send_task.abort();

    let mut sessions = state.sessions.write().await;
    sessions.remove(&session_id);
}

/// GET /sessions
/// Stats for all active sessions
pub async fn list_sessions(State(state): State<AppState>) -> impl IntoResponse {
    let sessions = state.sessions.read().await;
    let mut stats: Vec<SessionStats> = sessions.values().map(|rx| rx.borrow().clone()).collect();
    stats.sort_by(|a, b| a.started_at.cmp(&b.started_at));
    (StatusCode::OK, Json(stats))
}

/// GET /sessions/:session_id
/// Stats for one session
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let stats = {
        let sessions = state.sessions.read().await;
        sessions.get(&session_id).map(|rx| rx.borrow().clone())
    };

    match stats {
        Some(stats) => (StatusCode::OK, Json(stats)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Session {} not found", session_id),
            }),
        )
            .into_response(),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
