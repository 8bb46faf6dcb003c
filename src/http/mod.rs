//! HTTP API server for external control (recorder UI)
//!
//! This module provides a REST API for controlling the recording session:
//! - POST /session/access - Request capture access
//! - POST /session/start - Start a named recording
//! - POST /session/stop - Stop the active recording
//! - GET /session - Query session statistics
//! - GET /session/level - Latest level-meter sample
//! - GET /session/recording - Download the assembled recording
//! - POST /session/upload - Submit the recording for transcription
//! - POST /session/save - Save the recording to disk
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
