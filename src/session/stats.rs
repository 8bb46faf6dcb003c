use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::upload::UploadReport;

/// Lifecycle state of a recording session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No capture has run yet (or none since service start)
    Idle,
    /// The capture device is producing fragments
    Recording,
    /// The last capture run ended; a new one may start
    Stopped,
}

/// Snapshot of a recording session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    /// Session identifier used in logs
    pub session_id: String,

    /// Current lifecycle state
    pub state: SessionState,

    /// Whether capture access has been granted
    pub capture_ready: bool,

    /// Whether the last start attempt was rejected for an empty name
    pub invalid_name: bool,

    /// User-supplied recording name, once a start succeeded
    pub name: Option<String>,

    /// Whole seconds elapsed while recording; 0 outside of a run
    pub elapsed_secs: u64,

    /// When the current or last recording started
    pub started_at: Option<DateTime<Utc>>,

    /// Number of fragments captured in the current or last run
    pub fragment_count: usize,

    /// Total encoded bytes captured in the current or last run
    pub recorded_bytes: usize,

    /// Whether an assembled recording is available
    pub has_recording: bool,

    /// Current upload attempt snapshot
    pub upload: UploadReport,
}
