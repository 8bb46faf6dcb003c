//! Upload coordination for assembled recordings
//!
//! This module submits recordings to the external transcription service:
//! - `UploadCoordinator` tracks the single attempt lifecycle
//!   (not started / in flight / succeeded / failed)
//! - `TranscriptionService` abstracts the remote endpoint
//! - `HttpTranscriptionService` is the HTTP implementation

mod coordinator;
mod service;

pub use coordinator::{SubmitOutcome, UploadCoordinator, UploadReport, UploadStatus};
pub use service::{HttpTranscriptionService, TranscriptionResponse, TranscriptionService, UploadError};
