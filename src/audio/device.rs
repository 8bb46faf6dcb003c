use anyhow::Result;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors reported by a capture device
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The requested capture capability does not exist on this runtime.
    /// Fatal for the session; there is no retry path.
    #[error("capture not supported: {0}")]
    Unsupported(String),

    /// Permission to use the capture source was refused. The user may
    /// retry by requesting access again.
    #[error("capture access denied: {0}")]
    Denied(String),

    /// The device failed while starting, stopping, or producing events
    #[error("capture stream error: {0}")]
    Stream(String),
}

/// One encoded audio fragment produced during active capture
#[derive(Debug, Clone)]
pub struct AudioFragment {
    /// Opaque encoded audio bytes
    pub data: Vec<u8>,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
}

/// Frequency-bin amplitude snapshot used for level metering
#[derive(Debug, Clone)]
pub struct SpectrumFrame {
    /// Per-bin amplitude readings (0-255)
    pub bins: Vec<u8>,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
}

/// Events emitted by a capture device while a run is active
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    /// An encoded audio fragment, delivered in capture order
    Fragment(AudioFragment),
    /// A periodic amplitude snapshot for the level meter
    Spectrum(SpectrumFrame),
    /// Capture has fully stopped; every fragment of the run was delivered
    Stopped,
}

/// Configuration for a capture device
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Duration of audio covered by each fragment
    pub fragment_duration_ms: u64,
    /// Cadence of spectrum frames for the level meter
    pub spectrum_interval_ms: u64,
    /// Number of frequency bins per spectrum frame
    pub spectrum_bins: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            fragment_duration_ms: 250, // 4 fragments per second
            spectrum_interval_ms: 100,
            spectrum_bins: 32,
        }
    }
}

/// Audio capture device trait
///
/// Implementations:
/// - File: replays a WAV file in real time (demos, batch processing, tests)
/// - Microphone: native input (no audio host is linked into this build)
#[async_trait::async_trait]
pub trait CaptureDevice: Send + Sync {
    /// Ask for permission to use the capture source
    ///
    /// Must succeed before `start` is usable. Failures are surfaced to the
    /// caller; nothing is retried automatically.
    async fn request_access(&mut self) -> Result<(), CaptureError>;

    /// Begin producing capture events
    ///
    /// Returns a channel receiver that will receive fragments and spectrum
    /// frames in capture order until the run ends. The device delivers
    /// `CaptureEvent::Stopped` once every fragment has been flushed.
    async fn start(&mut self) -> Result<mpsc::Receiver<CaptureEvent>, CaptureError>;

    /// Stop capturing audio
    ///
    /// Pending fragments may still arrive on the run's channel after this
    /// returns; `CaptureEvent::Stopped` marks the end of the flush.
    async fn stop(&mut self) -> Result<(), CaptureError>;

    /// Check if the device is currently capturing
    fn is_capturing(&self) -> bool;

    /// Get device name for logging
    fn name(&self) -> &str;
}

/// Capture source type
#[derive(Debug, Clone)]
pub enum CaptureSource {
    /// Native microphone input
    Microphone,
    /// WAV file replayed in real time (demos, batch processing, tests)
    File(std::path::PathBuf),
}

/// Capture device factory
pub struct CaptureDeviceFactory;

impl CaptureDeviceFactory {
    /// Create a capture device based on the configured source
    pub fn create(source: CaptureSource, config: CaptureConfig) -> Result<Box<dyn CaptureDevice>> {
        match source {
            CaptureSource::File(path) => {
                let device = super::file::WavFileDevice::new(path, config);
                Ok(Box::new(device))
            }

            CaptureSource::Microphone => Ok(Box::new(MicrophoneDevice)),
        }
    }
}

/// Native microphone input
///
/// No audio host is linked into this build, so access requests always
/// report the capability as unsupported.
pub struct MicrophoneDevice;

#[async_trait::async_trait]
impl CaptureDevice for MicrophoneDevice {
    async fn request_access(&mut self) -> Result<(), CaptureError> {
        Err(CaptureError::Unsupported(
            "no native microphone host is linked into this build".to_string(),
        ))
    }

    async fn start(&mut self) -> Result<mpsc::Receiver<CaptureEvent>, CaptureError> {
        Err(CaptureError::Stream(
            "microphone capture was never granted access".to_string(),
        ))
    }

    async fn stop(&mut self) -> Result<(), CaptureError> {
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "microphone"
    }
}
