use super::state::AppState;
use crate::audio::CaptureError;
use crate::session::{SessionStats, StartOutcome};
use crate::upload::SubmitOutcome;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StartRecordingRequest {
    /// User-chosen name for the recording
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct StartRecordingResponse {
    pub status: String,
    pub name: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct StopRecordingResponse {
    pub status: String,
    pub message: String,
    pub stats: SessionStats,
}

#[derive(Debug, Serialize)]
pub struct AccessResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SaveRecordingResponse {
    pub saved_to: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Map a capture failure to the status code it should surface as
fn capture_error_status(e: &CaptureError) -> StatusCode {
    match e {
        CaptureError::Unsupported(_) => StatusCode::NOT_IMPLEMENTED,
        CaptureError::Denied(_) => StatusCode::FORBIDDEN,
        CaptureError::Stream(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /session/access
/// Request capture access from the device
pub async fn grant_access(State(state): State<AppState>) -> impl IntoResponse {
    match state.session.request_capture_access().await {
        Ok(()) => (
            StatusCode::OK,
            Json(AccessResponse {
                status: "ready".to_string(),
                message: "Capture access granted".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Capture access request failed: {}", e);
            (
                capture_error_status(&e),
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// POST /session/start
/// Start a new named recording
pub async fn start_recording(
    State(state): State<AppState>,
    Json(req): Json<StartRecordingRequest>,
) -> impl IntoResponse {
    match state.session.start(&req.name).await {
        Ok(StartOutcome::Started) => {
            info!("Recording started via HTTP: {:?}", req.name);
            (
                StatusCode::OK,
                Json(StartRecordingResponse {
                    status: "recording".to_string(),
                    name: req.name.clone(),
                    message: format!("Recording {:?} started", req.name),
                }),
            )
                .into_response()
        }
        Ok(StartOutcome::NotReady) => (
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: "Capture access has not been granted".to_string(),
            }),
        )
            .into_response(),
        Ok(StartOutcome::AlreadyRecording) => (
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: "A recording is already in progress".to_string(),
            }),
        )
            .into_response(),
        Ok(StartOutcome::InvalidName) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse {
                error: "Recording name must be a non-empty plain file name".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to start recording: {}", e);
            (
                capture_error_status(&e),
                Json(ErrorResponse {
                    error: format!("Failed to start recording: {}", e),
                }),
            )
                .into_response()
        }
    }
}

/// POST /session/stop
/// Stop the active recording and return final statistics
pub async fn stop_recording(State(state): State<AppState>) -> impl IntoResponse {
    match state.session.stop().await {
        Ok(()) => {
            let stats = state.session.stats().await;
            (
                StatusCode::OK,
                Json(StopRecordingResponse {
                    status: "stopped".to_string(),
                    message: "Recording stopped".to_string(),
                    stats,
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("Failed to stop recording: {}", e);
            (
                capture_error_status(&e),
                Json(ErrorResponse {
                    error: format!("Failed to stop recording: {}", e),
                }),
            )
                .into_response()
        }
    }
}

/// GET /session
/// Current session statistics
pub async fn get_session(State(state): State<AppState>) -> impl IntoResponse {
    let stats = state.session.stats().await;
    (StatusCode::OK, Json(stats))
}

/// GET /session/level
/// Latest level-meter sample
pub async fn get_level(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.session.level()))
}

/// GET /session/recording
/// Download the assembled recording
pub async fn download_recording(State(state): State<AppState>) -> impl IntoResponse {
    match state.session.download_recording().await {
        Some((name, recording)) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, recording.content_type.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}.webm\"", name),
                ),
            ],
            recording.data,
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "No assembled recording is available".to_string(),
            }),
        )
            .into_response(),
    }
}

/// POST /session/upload
/// Submit the assembled recording for transcription
pub async fn upload_recording(State(state): State<AppState>) -> impl IntoResponse {
    let recording = match state.session.recording().await {
        Some(recording) => recording,
        None => {
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: "No assembled recording to upload".to_string(),
                }),
            )
                .into_response();
        }
    };

    match state.coordinator.submit(&recording).await {
        SubmitOutcome::Completed(report) => (StatusCode::OK, Json(report)).into_response(),
        SubmitOutcome::AlreadyInFlight => (
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: "An upload is already in flight".to_string(),
            }),
        )
            .into_response(),
    }
}

/// POST /session/save
/// Write the assembled recording into the recordings directory
pub async fn save_recording(State(state): State<AppState>) -> impl IntoResponse {
    match state.session.save_recording(&state.recordings_dir).await {
        Ok(Some(path)) => (
            StatusCode::OK,
            Json(SaveRecordingResponse {
                saved_to: path.display().to_string(),
            }),
        )
            .into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "No assembled recording to save".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to save recording: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to save recording: {}", e),
                }),
            )
                .into_response()
        }
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
