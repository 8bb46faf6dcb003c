pub mod audio;
pub mod config;
pub mod http;
pub mod session;
pub mod upload;

pub use audio::{
    AudioFragment, BarState, CaptureConfig, CaptureDevice, CaptureDeviceFactory, CaptureError,
    CaptureEvent, CaptureSource, FragmentCollector, LevelMeter, LevelSample, MicrophoneDevice,
    Recording, SpectrumFrame, WavFileDevice, LEVEL_BARS, RECORDING_CONTENT_TYPE,
};
pub use config::Config;
pub use http::{create_router, AppState};
pub use session::{
    RecordingSession, SessionConfig, SessionNotice, SessionState, SessionStats, StartOutcome,
};
pub use upload::{
    HttpTranscriptionService, SubmitOutcome, TranscriptionResponse, TranscriptionService,
    UploadCoordinator, UploadError, UploadReport, UploadStatus,
};
