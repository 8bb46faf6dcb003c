use super::config::SessionConfig;
use super::stats::{SessionState, SessionStats};
use crate::audio::{
    CaptureDevice, CaptureError, CaptureEvent, FragmentCollector, LevelMeter, LevelSample,
    Recording,
};
use crate::upload::UploadCoordinator;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{error, info, warn};

/// Cadence of the elapsed-seconds counter
const PROGRESS_TICK: Duration = Duration::from_secs(1);

/// Outcome of a start attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// The session transitioned into `Recording`
    Started,
    /// Capture access has not been granted; nothing changed
    NotReady,
    /// A recording is already in progress; nothing changed
    AlreadyRecording,
    /// The supplied name is not usable as a file name; the invalid-name
    /// flag is now set
    InvalidName,
}

/// One-shot notification to whoever embeds the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionNotice {
    /// A new recording started; earlier results no longer apply
    Reset,
    /// The assembled recording was handed out
    RecordingDownloaded,
}

/// A recording session that manages audio capture, fragment collection, and
/// the assembled recording
pub struct RecordingSession {
    /// Session configuration
    config: SessionConfig,

    /// The capture device; the lock also serializes start/stop
    device: Mutex<Box<dyn CaptureDevice>>,

    /// Upload coordinator for the assembled recording
    coordinator: Arc<UploadCoordinator>,

    /// Recording state shared with the event pump
    data: Arc<Mutex<SessionData>>,

    /// Whether capture access has been granted
    capture_ready: AtomicBool,

    /// Whether the last start attempt was rejected for an empty name
    invalid_name: AtomicBool,

    /// Whole seconds since the active recording started
    elapsed_secs: Arc<AtomicU64>,

    /// Latest level-meter sample; stale samples are overwritten, never queued
    level_tx: Arc<watch::Sender<LevelSample>>,

    /// Lifecycle notices for the embedding application
    notice_tx: broadcast::Sender<SessionNotice>,

    /// Handle for the capture event pump task
    pump_task: Mutex<Option<JoinHandle<()>>>,

    /// Handle for the elapsed-seconds tick task
    tick_task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

/// State owned jointly by the session and its event pump
struct SessionData {
    state: SessionState,
    name: Option<String>,
    started_at: Option<DateTime<Utc>>,
    collector: FragmentCollector,
    recording: Option<Recording>,
}

impl RecordingSession {
    /// Create a new session around a capture device
    pub fn new(
        config: SessionConfig,
        device: Box<dyn CaptureDevice>,
        coordinator: Arc<UploadCoordinator>,
    ) -> Self {
        info!("Creating recording session: {}", config.session_id);

        let (level_tx, _) = watch::channel(LevelSample::dark());
        let (notice_tx, _) = broadcast::channel(16);

        Self {
            config,
            device: Mutex::new(device),
            coordinator,
            data: Arc::new(Mutex::new(SessionData {
                state: SessionState::Idle,
                name: None,
                started_at: None,
                collector: FragmentCollector::new(),
                recording: None,
            })),
            capture_ready: AtomicBool::new(false),
            invalid_name: AtomicBool::new(false),
            elapsed_secs: Arc::new(AtomicU64::new(0)),
            level_tx: Arc::new(level_tx),
            notice_tx,
            pump_task: Mutex::new(None),
            tick_task: Arc::new(Mutex::new(None)),
        }
    }

    /// Ask the capture device for access and remember the answer
    ///
    /// Recording cannot start until this has succeeded once.
    pub async fn request_capture_access(&self) -> Result<(), CaptureError> {
        let mut device = self.device.lock().await;

        match device.request_access().await {
            Ok(()) => {
                info!("Capture access granted ({} device)", device.name());
                self.capture_ready.store(true, Ordering::SeqCst);
                Ok(())
            }
            Err(e) => {
                error!("Capture access not granted: {}", e);
                Err(e)
            }
        }
    }

    /// Start a new recording under the given name
    ///
    /// The name later becomes the `<name>.webm` file name, so it must be a
    /// single plain path component. Rejections are reported through
    /// [`StartOutcome`]; only device failures surface as errors. A successful
    /// start discards the previous recording, its upload result, and the
    /// invalid-name flag.
    pub async fn start(&self, name: &str) -> Result<StartOutcome, CaptureError> {
        let mut device = self.device.lock().await;

        if !self.capture_ready.load(Ordering::SeqCst) {
            warn!("Capture access has not been granted; start ignored");
            return Ok(StartOutcome::NotReady);
        }

        if self.data.lock().await.state == SessionState::Recording {
            warn!("Recording already in progress; start ignored");
            return Ok(StartOutcome::AlreadyRecording);
        }

        if name.is_empty() {
            warn!("Start rejected: recording name is empty");
            self.invalid_name.store(true, Ordering::SeqCst);
            return Ok(StartOutcome::InvalidName);
        }

        if !is_plain_file_name(name) {
            warn!("Start rejected: recording name {:?} is not a plain file name", name);
            self.invalid_name.store(true, Ordering::SeqCst);
            return Ok(StartOutcome::InvalidName);
        }

        info!(
            "Starting recording {:?} (session {})",
            name, self.config.session_id
        );

        // Tasks left over from an earlier run are superseded
        if let Some(task) = self.pump_task.lock().await.take() {
            task.abort();
        }
        if let Some(task) = self.tick_task.lock().await.take() {
            task.abort();
        }

        {
            let mut data = self.data.lock().await;
            data.collector.reset();
            data.recording = None;
            data.name = Some(name.to_string());
            data.started_at = Some(Utc::now());
        }
        self.coordinator.reset().await;
        let _ = self.notice_tx.send(SessionNotice::Reset);
        self.invalid_name.store(false, Ordering::SeqCst);
        self.elapsed_secs.store(0, Ordering::SeqCst);
        self.level_tx.send_replace(LevelSample::dark());

        let events = match device.start().await {
            Ok(events) => events,
            Err(e) => {
                error!("Failed to start capture device: {}", e);
                return Err(e);
            }
        };

        self.data.lock().await.state = SessionState::Recording;
        *self.pump_task.lock().await = Some(self.spawn_pump(events));
        *self.tick_task.lock().await = Some(self.spawn_tick());

        Ok(StartOutcome::Started)
    }

    /// Stop the active recording
    ///
    /// Waits for the device to flush its final fragments and for the
    /// assembled recording to become available. A no-op unless a recording
    /// is in progress.
    pub async fn stop(&self) -> Result<(), CaptureError> {
        let mut device = self.device.lock().await;

        {
            // Transition first so level samples stop rendering immediately
            let mut data = self.data.lock().await;
            if data.state != SessionState::Recording {
                warn!("Recording not active; stop ignored");
                return Ok(());
            }
            data.state = SessionState::Stopped;
        }

        let device_result = device.stop().await;

        if let Some(task) = self.tick_task.lock().await.take() {
            task.abort();
        }
        let elapsed = self.elapsed_secs.swap(0, Ordering::SeqCst);
        self.level_tx.send_replace(LevelSample::dark());

        let pump = self.pump_task.lock().await.take();
        match device_result {
            Ok(()) => {
                // The pump exits once the device reports its final stop, at
                // which point the recording has been assembled
                if let Some(task) = pump {
                    if let Err(e) = task.await {
                        error!("Capture pump task failed: {}", e);
                    }
                }
                info!(
                    "Recording stopped after {}s (session {})",
                    elapsed, self.config.session_id
                );
                Ok(())
            }
            Err(e) => {
                error!("Failed to stop capture device: {}", e);
                if let Some(task) = pump {
                    task.abort();
                }
                Err(e)
            }
        }
    }

    /// Get current session statistics
    pub async fn stats(&self) -> SessionStats {
        let data = self.data.lock().await;

        SessionStats {
            session_id: self.config.session_id.clone(),
            state: data.state,
            capture_ready: self.capture_ready.load(Ordering::SeqCst),
            invalid_name: self.invalid_name.load(Ordering::SeqCst),
            name: data.name.clone(),
            elapsed_secs: self.elapsed_secs.load(Ordering::SeqCst),
            started_at: data.started_at,
            fragment_count: data.collector.len(),
            recorded_bytes: data.collector.byte_len(),
            has_recording: data.recording.is_some(),
            upload: self.coordinator.report().await,
        }
    }

    /// Latest level-meter sample
    pub fn level(&self) -> LevelSample {
        self.level_tx.borrow().clone()
    }

    /// Watch the level meter; receivers only ever see the newest sample
    pub fn subscribe_level(&self) -> watch::Receiver<LevelSample> {
        self.level_tx.subscribe()
    }

    /// Subscribe to lifecycle notices
    pub fn subscribe(&self) -> broadcast::Receiver<SessionNotice> {
        self.notice_tx.subscribe()
    }

    /// The assembled recording, if one exists
    pub async fn recording(&self) -> Option<Recording> {
        self.data.lock().await.recording.clone()
    }

    /// Hand out the assembled recording under its user-chosen name
    ///
    /// Fires [`SessionNotice::RecordingDownloaded`]. `None` until a run has
    /// produced at least one fragment.
    pub async fn download_recording(&self) -> Option<(String, Recording)> {
        let data = self.data.lock().await;
        let recording = data.recording.clone()?;
        let name = data.name.clone().unwrap_or_else(|| "recording".to_string());

        let _ = self.notice_tx.send(SessionNotice::RecordingDownloaded);
        Some((name, recording))
    }

    /// Write the assembled recording to `<dir>/<name>.webm`
    pub async fn save_recording(&self, dir: &Path) -> Result<Option<PathBuf>> {
        let (name, recording) = {
            let data = self.data.lock().await;
            match (&data.name, &data.recording) {
                (Some(name), Some(recording)) => (name.clone(), recording.clone()),
                _ => {
                    warn!("No assembled recording to save");
                    return Ok(None);
                }
            }
        };

        std::fs::create_dir_all(dir).context("Failed to create recordings directory")?;
        let path = dir.join(format!("{}.webm", name));
        std::fs::write(&path, &recording.data)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        info!(
            "Recording saved to {} ({} bytes)",
            path.display(),
            recording.data.len()
        );
        let _ = self.notice_tx.send(SessionNotice::RecordingDownloaded);

        Ok(Some(path))
    }

    /// Stop capture and cancel the session's background tasks
    pub async fn shutdown(&self) {
        info!("Shutting down session {}", self.config.session_id);

        let mut device = self.device.lock().await;
        if device.is_capturing() {
            if let Err(e) = device.stop().await {
                error!("Failed to stop capture device: {}", e);
            }
        }

        if let Some(task) = self.tick_task.lock().await.take() {
            task.abort();
        }
        if let Some(task) = self.pump_task.lock().await.take() {
            task.abort();
        }
        self.level_tx.send_replace(LevelSample::dark());
    }

    /// Spawn the task that consumes one run's capture events in order
    ///
    /// Fragments append to the collector, including those the device flushes
    /// after a stop request. Spectrum frames feed the level meter only while
    /// the state is `Recording`. The device's stop event triggers assembly.
    fn spawn_pump(&self, mut events: mpsc::Receiver<CaptureEvent>) -> JoinHandle<()> {
        let data = Arc::clone(&self.data);
        let elapsed_secs = Arc::clone(&self.elapsed_secs);
        let level_tx = Arc::clone(&self.level_tx);
        let tick_task = Arc::clone(&self.tick_task);
        let session_id = self.config.session_id.clone();

        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    CaptureEvent::Fragment(fragment) => {
                        data.lock().await.collector.append(fragment);
                    }
                    CaptureEvent::Spectrum(frame) => {
                        let data = data.lock().await;
                        if data.state == SessionState::Recording {
                            level_tx.send_replace(LevelMeter::reduce(&frame.bins));
                        }
                    }
                    CaptureEvent::Stopped => break,
                }
            }

            // Every fragment of the run has arrived
            let mut data = data.lock().await;
            if data.state == SessionState::Recording {
                // The device ended the run on its own
                data.state = SessionState::Stopped;
                if let Some(task) = tick_task.lock().await.take() {
                    task.abort();
                }
                elapsed_secs.store(0, Ordering::SeqCst);
                level_tx.send_replace(LevelSample::dark());
                info!("Capture ended by the device (session {})", session_id);
            }
            data.recording = data.collector.assemble();
        })
    }

    /// Spawn the task that advances the elapsed-seconds counter
    fn spawn_tick(&self) -> JoinHandle<()> {
        let elapsed_secs = Arc::clone(&self.elapsed_secs);

        tokio::spawn(async move {
            let mut tick = time::interval(PROGRESS_TICK);
            // The first tick of an interval completes immediately
            tick.tick().await;
            loop {
                tick.tick().await;
                elapsed_secs.fetch_add(1, Ordering::SeqCst);
            }
        })
    }
}

/// Whether a recording name can serve as a file name on its own
///
/// The name must round-trip as a single normal path component; anything
/// with separators or relative parts would address outside the recordings
/// directory.
fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(part)), None) => part == OsStr::new(name),
        _ => false,
    }
}
