use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::audio::Recording;

/// Errors that can occur while submitting a recording
#[derive(Debug, Error)]
pub enum UploadError {
    /// Transport-level failure (connect, timeout, request build)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The service rejected the recording; the display form is the
    /// service's own message
    #[error("{message}")]
    Service { status: u16, message: String },

    /// The service answered success with a body that does not match the
    /// transcription contract
    #[error("invalid service response: {0}")]
    Response(String),
}

/// Successful transcription service response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionResponse {
    /// Transcribed text
    pub transcript: String,
    /// Payload size acknowledged by the service, in bytes
    pub size: u64,
}

/// Error body returned by the transcription service on rejection
#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    message: String,
}

/// Trait for transcription upload backends
///
/// The coordinator treats this as an opaque async call with exactly one
/// of two outcomes per submission.
#[async_trait::async_trait]
pub trait TranscriptionService: Send + Sync {
    /// Submit one recording payload and await its terminal outcome
    async fn transcribe(&self, recording: &Recording) -> Result<TranscriptionResponse, UploadError>;

    /// Get service name for logging
    fn name(&self) -> &str;
}

/// Transcription service reached over HTTP
///
/// Posts the recording bytes as the request body with the recording's
/// content type. A success response is deserialized as
/// `{ "transcript": ..., "size": ... }`; a rejection body as
/// `{ "message": ... }`, falling back to the HTTP status line when the
/// body is not in that shape.
pub struct HttpTranscriptionService {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTranscriptionService {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait::async_trait]
impl TranscriptionService for HttpTranscriptionService {
    async fn transcribe(&self, recording: &Recording) -> Result<TranscriptionResponse, UploadError> {
        debug!(
            "Sending {} bytes ({}) to {}",
            recording.data.len(),
            recording.content_type,
            self.endpoint
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, recording.content_type)
            .body(recording.data.clone())
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ServiceErrorBody>(&body)
                .map(|rejection| rejection.message)
                .unwrap_or_else(|_| format!("service returned {}", status));
            return Err(UploadError::Service {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<TranscriptionResponse>()
            .await
            .map_err(|e| UploadError::Response(e.to_string()))
    }

    fn name(&self) -> &str {
        "http"
    }
}
