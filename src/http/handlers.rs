use super::state::AppState;
use crate::error::RecorderError;
use crate::session::{Notification, RecordingSession, SessionState};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct StartRecordingRequest {
    /// Optional output file (if not provided, generate one in the output dir)
    pub output_path: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct StartRecordingResponse {
    pub output_path: PathBuf,
    pub state: SessionState,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct StopRecordingResponse {
    pub state: SessionState,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub state: SessionState,
    pub session: Option<RecordingSession>,
    pub last_notification: Option<Notification>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(err: &RecorderError) -> Response {
    let status = match err {
        RecorderError::InvalidState(_) | RecorderError::NotRunning => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /recording/start
/// Probe devices and launch the encoder
pub async fn start_recording(
    State(state): State<AppState>,
    Json(req): Json<StartRecordingRequest>,
) -> Response {
    let output_path = req.output_path.unwrap_or_else(|| {
        state
            .output_dir
            .join(format!("recording-{}.mp4", uuid::Uuid::new_v4()))
    });

    info!("Starting recording into {}", output_path.display());

    if let Err(e) = state.controller.start(output_path.clone()).await {
        error!("Failed to start recording: {}", e);
        return error_response(&e);
    }

    let session_state = state.controller.state().await;
    (
        StatusCode::OK,
        Json(StartRecordingResponse {
            output_path: output_path.clone(),
            state: session_state,
            message: format!("Recording started into {}", output_path.display()),
        }),
    )
        .into_response()
}

/// POST /recording/stop
/// Ask the encoder to finalize the current recording
pub async fn stop_recording(State(state): State<AppState>) -> Response {
    info!("Stopping recording");

    if let Err(e) = state.controller.stop().await {
        error!("Failed to stop recording: {}", e);
        return error_response(&e);
    }

    (
        StatusCode::OK,
        Json(StopRecordingResponse {
            state: state.controller.state().await,
            message: "Stop requested".to_string(),
        }),
    )
        .into_response()
}

/// GET /recording/status
pub async fn get_recording_status(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.controller.status().await;
    let current = session
        .as_ref()
        .map(|s| s.state)
        .unwrap_or(SessionState::Idle);

    (
        StatusCode::OK,
        Json(StatusResponse {
            state: current,
            session,
            last_notification: state.board.last(),
        }),
    )
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
