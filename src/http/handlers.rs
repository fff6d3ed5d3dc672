use super::state::AppState;
use crate::session::{SessionContext, SessionSnapshot, TranscriptEntry, VoiceSessionController};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    /// Optional session ID (if not provided, generate UUID)
    pub session_id: Option<String>,

    /// Companion this conversation belongs to
    pub companion_id: String,

    pub subject: String,
    pub topic: String,

    /// Conversational style (default: "casual")
    pub style: Option<String>,

    /// Voice variant (default: "female")
    pub voice: Option<String>,

    pub companion_name: Option<String>,
    pub user_name: Option<String>,
    pub user_avatar: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
    pub message: String,
    pub snapshot: SessionSnapshot,
}

#[derive(Debug, Serialize)]
pub struct StopSessionResponse {
    pub session_id: String,
    pub message: String,
    pub snapshot: SessionSnapshot,
}

#[derive(Debug, Serialize)]
pub struct MuteResponse {
    pub session_id: String,
    pub muted: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /sessions
/// Create a session controller for a companion and start the call
pub async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> impl IntoResponse {
    let session_id = req
        .session_id
        .clone()
        .unwrap_or_else(|| format!("session-{}", uuid::Uuid::new_v4()));

    info!("creating voice session: {}", session_id);

    let context = SessionContext {
        companion_id: req.companion_id,
        subject: req.subject,
        topic: req.topic,
        style: req.style.unwrap_or_else(|| "casual".to_string()),
        voice: req.voice.unwrap_or_else(|| "female".to_string()),
        companion_name: req.companion_name.unwrap_or_else(|| "Companion".to_string()),
        user_name: req.user_name.unwrap_or_else(|| "Learner".to_string()),
        user_avatar: req.user_avatar.unwrap_or_default(),
    };

    let controller = Arc::new(VoiceSessionController::new(
        context,
        state.channels.create(),
        Arc::clone(&state.history),
    ));

    // Register before starting: a failed start stays inspectable, so the
    // client can read last_error from the snapshot and retry.
    {
        let mut sessions = state.sessions.write().await;
        if sessions.contains_key(&session_id) {
            return (
                StatusCode::CONFLICT,
                Json(ErrorResponse {
                    error: format!("Session {} already exists", session_id),
                }),
            )
                .into_response();
        }
        sessions.insert(session_id.clone(), Arc::clone(&controller));
    }

    match controller.start().await {
        Ok(()) => {
            let snapshot = controller.snapshot().await;
            (
                StatusCode::OK,
                Json(CreateSessionResponse {
                    session_id: session_id.clone(),
                    message: format!("Session {} connecting", session_id),
                    snapshot,
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("failed to start session {}: {}", session_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// POST /sessions/:session_id/start
/// Retry/restart an existing session
pub async fn start_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let controller = {
        let sessions = state.sessions.read().await;
        sessions.get(&session_id).cloned()
    };

    match controller {
        Some(controller) => match controller.start().await {
            Ok(()) => {
                let snapshot = controller.snapshot().await;
                (
                    StatusCode::OK,
                    Json(CreateSessionResponse {
                        session_id: session_id.clone(),
                        message: format!("Session {} connecting", session_id),
                        snapshot,
                    }),
                )
                    .into_response()
            }
            Err(e) => {
                error!("failed to start session {}: {}", session_id, e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: e.to_string(),
                    }),
                )
                    .into_response()
            }
        },
        None => session_not_found(&session_id),
    }
}

/// POST /sessions/:session_id/stop
/// User-initiated disconnect
pub async fn stop_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let controller = {
        let sessions = state.sessions.read().await;
        sessions.get(&session_id).cloned()
    };

    match controller {
        Some(controller) => {
            controller.stop().await;
            let snapshot = controller.snapshot().await;
            info!("voice session {} stopped", session_id);
            (
                StatusCode::OK,
                Json(StopSessionResponse {
                    session_id: session_id.clone(),
                    message: "Session ended".to_string(),
                    snapshot,
                }),
            )
                .into_response()
        }
        None => session_not_found(&session_id),
    }
}

/// POST /sessions/:session_id/mute
/// Toggle the learner's microphone
pub async fn toggle_mute(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let controller = {
        let sessions = state.sessions.read().await;
        sessions.get(&session_id).cloned()
    };

    match controller {
        Some(controller) => {
            let muted = controller.toggle_mute().await;
            (StatusCode::OK, Json(MuteResponse { session_id, muted })).into_response()
        }
        None => session_not_found(&session_id),
    }
}

/// GET /sessions/:session_id
/// Current snapshot of a session
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let sessions = state.sessions.read().await;

    match sessions.get(&session_id) {
        Some(controller) => (StatusCode::OK, Json(controller.snapshot().await)).into_response(),
        None => session_not_found(&session_id),
    }
}

/// GET /sessions/:session_id/transcript
/// Ordered transcript accumulated so far
pub async fn get_transcript(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let sessions = state.sessions.read().await;

    match sessions.get(&session_id) {
        Some(controller) => {
            let transcript: Vec<TranscriptEntry> = controller.transcript().await;
            (StatusCode::OK, Json(transcript)).into_response()
        }
        None => session_not_found(&session_id),
    }
}

/// DELETE /sessions/:session_id
/// Tear a session down, releasing its timer and event subscription
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let controller = {
        let mut sessions = state.sessions.write().await;
        sessions.remove(&session_id)
    };

    match controller {
        Some(controller) => {
            controller.stop().await;
            controller.shutdown();
            info!("voice session {} removed", session_id);
            (
                StatusCode::OK,
                Json(serde_json::json!({ "removed": session_id })),
            )
                .into_response()
        }
        None => session_not_found(&session_id),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

fn session_not_found(session_id: &str) -> axum::response::Response {
    error!("session {} not found", session_id);
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("Session {} not found", session_id),
        }),
    )
        .into_response()
}
