use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::service::TranscriptionService;
use crate::audio::Recording;

/// Status of the current upload attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    #[default]
    NotStarted,
    InFlight,
    Succeeded,
    Failed,
}

/// Snapshot of the current upload attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UploadReport {
    pub status: UploadStatus,
    /// Transcript text on success, human-readable error text on failure
    pub result_message: Option<String>,
}

/// Result of one submit call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The attempt ran to a terminal status
    Completed(UploadReport),
    /// A previous attempt is still in flight; this submit was rejected
    AlreadyInFlight,
}

/// Coordinates submissions of an assembled recording to the
/// transcription service
///
/// At most one attempt is in flight at a time. Failures become a terminal
/// `Failed` report; nothing is retried automatically, the user re-submits
/// explicitly. A session reset discards the attempt state, including the
/// outcome of an attempt still in flight at that moment.
pub struct UploadCoordinator {
    service: Box<dyn TranscriptionService>,

    /// Attempt snapshot served to status queries
    report: Mutex<UploadReport>,

    /// Guards against a second concurrent attempt
    in_flight: AtomicBool,

    /// Bumped on every reset; an attempt only records its outcome when its
    /// generation is still current
    generation: AtomicU64,
}

impl UploadCoordinator {
    pub fn new(service: Box<dyn TranscriptionService>) -> Self {
        Self {
            service,
            report: Mutex::new(UploadReport::default()),
            in_flight: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        }
    }

    /// Submit one recording and await its terminal outcome
    ///
    /// Rejected without side effects when an attempt is already in flight.
    pub async fn submit(&self, recording: &Recording) -> SubmitOutcome {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            warn!("Upload already in flight; submit rejected");
            return SubmitOutcome::AlreadyInFlight;
        }

        let generation = self.generation.load(Ordering::SeqCst);

        {
            let mut report = self.report.lock().await;
            report.status = UploadStatus::InFlight;
            report.result_message = None;
        }

        info!(
            "Uploading recording via {} service ({} bytes)",
            self.service.name(),
            recording.data.len()
        );

        let terminal = match self.service.transcribe(recording).await {
            Ok(response) => {
                info!(
                    "Upload succeeded: transcript {:?} ({} bytes)",
                    response.transcript, response.size
                );
                UploadReport {
                    status: UploadStatus::Succeeded,
                    result_message: Some(response.transcript),
                }
            }
            Err(e) => {
                error!("Upload failed: {}", e);
                UploadReport {
                    status: UploadStatus::Failed,
                    result_message: Some(e.to_string()),
                }
            }
        };

        let mut report = self.report.lock().await;
        if self.generation.load(Ordering::SeqCst) == generation {
            *report = terminal.clone();
            self.in_flight.store(false, Ordering::SeqCst);
        } else {
            // A new recording started while this attempt was in flight;
            // its outcome no longer applies to the session
            debug!("Upload outcome discarded; session was reset during the attempt");
        }

        SubmitOutcome::Completed(terminal)
    }

    /// Discard the current attempt state
    ///
    /// Invoked whenever a new recording starts, so stale upload results
    /// never bleed into the new session.
    pub async fn reset(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.in_flight.store(false, Ordering::SeqCst);

        let mut report = self.report.lock().await;
        report.status = UploadStatus::NotStarted;
        report.result_message = None;
    }

    /// Snapshot of the current attempt
    pub async fn report(&self) -> UploadReport {
        self.report.lock().await.clone()
    }
}
