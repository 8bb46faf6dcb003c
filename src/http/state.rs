use crate::session::RecordingSession;
use crate::upload::UploadCoordinator;
use std::path::PathBuf;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The recording session behind the control surface
    pub session: Arc<RecordingSession>,

    /// Upload coordinator shared with the session
    pub coordinator: Arc<UploadCoordinator>,

    /// Directory assembled recordings are saved into
    pub recordings_dir: PathBuf,
}

impl AppState {
    pub fn new(
        session: Arc<RecordingSession>,
        coordinator: Arc<UploadCoordinator>,
        recordings_dir: PathBuf,
    ) -> Self {
        Self {
            session,
            coordinator,
            recordings_dir,
        }
    }
}
