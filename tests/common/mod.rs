// Shared test doubles for driving a session without real capture hardware
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use voxpad::{
    AudioFragment, CaptureDevice, CaptureError, CaptureEvent, Recording, RecordingSession,
    SessionConfig, SpectrumFrame, TranscriptionResponse, TranscriptionService, UploadCoordinator,
    UploadError,
};

/// Capture device scripted directly by the tests
///
/// `start` hands the session a channel; the matching [`DeviceHandle`] feeds
/// events into it. A stop request flushes the scripted flush events and
/// then the final stop event, mirroring a device that drains its encoder.
pub struct ScriptedDevice {
    handle: DeviceHandle,
    flush_on_stop: Vec<CaptureEvent>,
    access_error: Option<CaptureError>,
    start_error: Option<CaptureError>,
}

/// Test-side handle for feeding events into a started device
#[derive(Clone)]
pub struct DeviceHandle {
    tx: Arc<StdMutex<Option<mpsc::Sender<CaptureEvent>>>>,
    capturing: Arc<AtomicBool>,
}

impl ScriptedDevice {
    pub fn new() -> (Self, DeviceHandle) {
        let handle = DeviceHandle {
            tx: Arc::new(StdMutex::new(None)),
            capturing: Arc::new(AtomicBool::new(false)),
        };
        (
            Self {
                handle: handle.clone(),
                flush_on_stop: Vec::new(),
                access_error: None,
                start_error: None,
            },
            handle,
        )
    }

    /// Events delivered between a stop request and the final stop event
    pub fn with_flush(mut self, events: Vec<CaptureEvent>) -> Self {
        self.flush_on_stop = events;
        self
    }

    /// Fail the next access request with the given error
    pub fn with_access_error(mut self, error: CaptureError) -> Self {
        self.access_error = Some(error);
        self
    }

    /// Fail the next start with the given error
    pub fn with_start_error(mut self, error: CaptureError) -> Self {
        self.start_error = Some(error);
        self
    }
}

impl DeviceHandle {
    async fn send(&self, event: CaptureEvent) {
        let tx = self
            .tx
            .lock()
            .unwrap()
            .clone()
            .expect("device has not been started");
        tx.send(event).await.expect("event channel closed");
    }

    pub async fn fragment(&self, data: &[u8], timestamp_ms: u64) {
        self.send(CaptureEvent::Fragment(AudioFragment {
            data: data.to_vec(),
            timestamp_ms,
        }))
        .await;
    }

    pub async fn spectrum(&self, bins: &[u8]) {
        self.send(CaptureEvent::Spectrum(SpectrumFrame {
            bins: bins.to_vec(),
            timestamp_ms: 0,
        }))
        .await;
    }

    /// End the run from the device side, as if its input were exhausted
    ///
    /// The capturing flag clears before the stop event so observers of the
    /// event already see the run as over.
    pub async fn end_of_input(&self) {
        self.capturing.store(false, Ordering::SeqCst);
        self.send(CaptureEvent::Stopped).await;
    }

    pub fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CaptureDevice for ScriptedDevice {
    async fn request_access(&mut self) -> Result<(), CaptureError> {
        match self.access_error.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn start(&mut self) -> Result<mpsc::Receiver<CaptureEvent>, CaptureError> {
        if let Some(error) = self.start_error.take() {
            return Err(error);
        }

        let (tx, rx) = mpsc::channel(100);
        *self.handle.tx.lock().unwrap() = Some(tx);
        self.handle.capturing.store(true, Ordering::SeqCst);
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<(), CaptureError> {
        if !self.handle.capturing.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        let tx = self.handle.tx.lock().unwrap().clone();
        if let Some(tx) = tx {
            for event in self.flush_on_stop.drain(..) {
                let _ = tx.send(event).await;
            }
            let _ = tx.send(CaptureEvent::Stopped).await;
        }
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.handle.capturing.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Transcription stub that succeeds with a fixed transcript
pub struct StaticTranscription;

#[async_trait]
impl TranscriptionService for StaticTranscription {
    async fn transcribe(
        &self,
        recording: &Recording,
    ) -> Result<TranscriptionResponse, UploadError> {
        Ok(TranscriptionResponse {
            transcript: "hello world".to_string(),
            size: recording.data.len() as u64,
        })
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Transcription stub that blocks until the test releases it
pub struct GatedTranscription {
    gate: StdMutex<Option<oneshot::Receiver<()>>>,
}

impl GatedTranscription {
    pub fn new() -> (Self, oneshot::Sender<()>) {
        let (release, gate) = oneshot::channel();
        (
            Self {
                gate: StdMutex::new(Some(gate)),
            },
            release,
        )
    }
}

#[async_trait]
impl TranscriptionService for GatedTranscription {
    async fn transcribe(
        &self,
        recording: &Recording,
    ) -> Result<TranscriptionResponse, UploadError> {
        let gate = self.gate.lock().unwrap().take().expect("gate already consumed");
        let _ = gate.await;
        Ok(TranscriptionResponse {
            transcript: "released".to_string(),
            size: recording.data.len() as u64,
        })
    }

    fn name(&self) -> &str {
        "gated"
    }
}

/// Session wired to a scripted device and the static transcription stub
pub fn scripted_session(
    device: ScriptedDevice,
) -> (Arc<RecordingSession>, Arc<UploadCoordinator>) {
    let coordinator = Arc::new(UploadCoordinator::new(Box::new(StaticTranscription)));
    let session = Arc::new(RecordingSession::new(
        SessionConfig {
            session_id: "test-session".to_string(),
        },
        Box::new(device),
        Arc::clone(&coordinator),
    ));
    (session, coordinator)
}
