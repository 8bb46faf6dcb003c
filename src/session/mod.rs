//! Recording session management
//!
//! This module provides the `RecordingSession` abstraction that manages:
//! - Capture access and the recording lifecycle (idle/recording/stopped)
//! - Fragment collection and assembly of the final recording
//! - The elapsed-time counter and the live level meter
//! - Download, save, and upload of the assembled recording
//! - Session statistics and lifecycle notices

mod config;
mod session;
mod stats;

pub use config::SessionConfig;
pub use session::{RecordingSession, SessionNotice, StartOutcome};
pub use stats::{SessionState, SessionStats};
