use hound::{SampleFormat, WavReader};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time;
use tracing::{debug, info};

use super::device::{AudioFragment, CaptureConfig, CaptureDevice, CaptureError, CaptureEvent, SpectrumFrame};

/// Capture device that replays a WAV file in real time
///
/// Access is granted by opening and validating the file. Fragments are
/// successive slices of the raw file bytes, so concatenating a full run
/// reproduces the source exactly. Spectrum frames carry per-bin mean
/// amplitudes of the decoded samples, scaled to 0-255.
pub struct WavFileDevice {
    path: PathBuf,
    config: CaptureConfig,
    source: Option<Arc<LoadedWav>>,
    capturing: Arc<AtomicBool>,
    stopping: Arc<AtomicBool>,
}

/// WAV file contents held in memory for the duration of the session
struct LoadedWav {
    /// Raw encoded file bytes (sliced into fragments)
    bytes: Vec<u8>,
    /// Decoded PCM samples (reduced into spectrum frames)
    samples: Vec<i16>,
    /// Playback duration in milliseconds
    duration_ms: u64,
}

impl WavFileDevice {
    pub fn new(path: PathBuf, config: CaptureConfig) -> Self {
        Self {
            path,
            config,
            source: None,
            capturing: Arc::new(AtomicBool::new(false)),
            stopping: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[async_trait::async_trait]
impl CaptureDevice for WavFileDevice {
    async fn request_access(&mut self) -> Result<(), CaptureError> {
        let reader = WavReader::open(&self.path).map_err(|e| match e {
            hound::Error::IoError(io) => {
                CaptureError::Denied(format!("cannot open {}: {}", self.path.display(), io))
            }
            other => CaptureError::Unsupported(format!("{}: {}", self.path.display(), other)),
        })?;

        let spec = reader.spec();
        if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
            return Err(CaptureError::Unsupported(format!(
                "only PCM16 WAV input is supported, got {:?} {}-bit",
                spec.sample_format, spec.bits_per_sample
            )));
        }

        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| CaptureError::Unsupported(format!("failed to decode samples: {}", e)))?;

        let bytes = std::fs::read(&self.path).map_err(|e| {
            CaptureError::Denied(format!("cannot read {}: {}", self.path.display(), e))
        })?;

        let duration_ms =
            samples.len() as u64 * 1000 / (spec.sample_rate as u64 * spec.channels as u64);

        info!(
            "Capture source loaded: {} ({:.1}s, {}Hz, {} channels, {} samples)",
            self.path.display(),
            duration_ms as f64 / 1000.0,
            spec.sample_rate,
            spec.channels,
            samples.len()
        );

        self.source = Some(Arc::new(LoadedWav {
            bytes,
            samples,
            duration_ms,
        }));

        Ok(())
    }

    async fn start(&mut self) -> Result<mpsc::Receiver<CaptureEvent>, CaptureError> {
        let source = self
            .source
            .as_ref()
            .map(Arc::clone)
            .ok_or_else(|| CaptureError::Stream("capture access has not been granted".to_string()))?;

        if self.capturing.load(Ordering::SeqCst) {
            return Err(CaptureError::Stream("already capturing".to_string()));
        }

        info!(
            "Starting WAV playback: {} ({} bytes)",
            self.path.display(),
            source.bytes.len()
        );

        let (tx, rx) = mpsc::channel(100);

        self.stopping.store(false, Ordering::SeqCst);
        self.capturing.store(true, Ordering::SeqCst);

        let config = self.config.clone();
        let capturing = Arc::clone(&self.capturing);
        let stopping = Arc::clone(&self.stopping);

        tokio::spawn(async move {
            let total_bytes = source.bytes.len();
            let total_samples = source.samples.len();
            let duration_ms = source.duration_ms.max(1);

            // Per-tick byte/sample budgets, sized so that elapsed time maps
            // onto file position
            let fragment_bytes =
                ((total_bytes as u64 * config.fragment_duration_ms / duration_ms).max(1)) as usize;
            let window_samples =
                ((total_samples as u64 * config.spectrum_interval_ms / duration_ms).max(1)) as usize;

            let mut byte_offset = 0usize;
            let mut sample_offset = 0usize;
            let mut position_ms = 0u64;
            let mut spectrum_ms = 0u64;

            let mut fragment_tick =
                time::interval(Duration::from_millis(config.fragment_duration_ms));
            let mut spectrum_tick =
                time::interval(Duration::from_millis(config.spectrum_interval_ms));
            // The first tick of an interval completes immediately
            fragment_tick.tick().await;
            spectrum_tick.tick().await;

            loop {
                tokio::select! {
                    _ = fragment_tick.tick() => {
                        let end = (byte_offset + fragment_bytes).min(total_bytes);
                        if end > byte_offset {
                            let fragment = AudioFragment {
                                data: source.bytes[byte_offset..end].to_vec(),
                                timestamp_ms: position_ms,
                            };
                            if tx.send(CaptureEvent::Fragment(fragment)).await.is_err() {
                                break;
                            }
                            byte_offset = end;
                        }
                        position_ms += config.fragment_duration_ms;

                        if stopping.load(Ordering::SeqCst) || byte_offset >= total_bytes {
                            // The flag must read false by the time the stop
                            // event is delivered; a restart may react to it
                            capturing.store(false, Ordering::SeqCst);
                            let _ = tx.send(CaptureEvent::Stopped).await;
                            break;
                        }
                    }
                    _ = spectrum_tick.tick() => {
                        if stopping.load(Ordering::SeqCst) {
                            continue;
                        }
                        let end = (sample_offset + window_samples).min(total_samples);
                        if end > sample_offset {
                            let frame = SpectrumFrame {
                                bins: bin_amplitudes(
                                    &source.samples[sample_offset..end],
                                    config.spectrum_bins,
                                ),
                                timestamp_ms: spectrum_ms,
                            };
                            if tx.send(CaptureEvent::Spectrum(frame)).await.is_err() {
                                break;
                            }
                            sample_offset = end;
                        }
                        spectrum_ms += config.spectrum_interval_ms;
                    }
                }
            }

            capturing.store(false, Ordering::SeqCst);
            debug!("WAV playback task finished at {}ms", position_ms);
        });

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<(), CaptureError> {
        if !self.capturing.load(Ordering::SeqCst) {
            return Ok(());
        }

        info!("Stopping WAV playback");

        // The playback task flushes the in-flight fragment and emits
        // `Stopped` on its next tick
        self.stopping.store(true, Ordering::SeqCst);

        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "wav file"
    }
}

/// Mean absolute amplitude per frequency bin, scaled to 0-255
fn bin_amplitudes(window: &[i16], bins: usize) -> Vec<u8> {
    let bins = bins.max(1);
    let segment_len = (window.len() / bins).max(1);
    let mut out = Vec::with_capacity(bins);

    for bin in 0..bins {
        let start = bin * segment_len;
        if start >= window.len() {
            out.push(0);
            continue;
        }
        let end = ((bin + 1) * segment_len).min(window.len());

        let sum: u64 = window[start..end]
            .iter()
            .map(|&sample| (sample as i64).unsigned_abs())
            .sum();
        let mean = sum as f64 / (end - start) as f64;

        out.push(((mean / i16::MAX as f64) * 255.0).round() as u8);
    }

    out
}
