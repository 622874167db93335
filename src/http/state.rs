use crate::session::{RecordingSessionController, StatusBoard};
use std::path::PathBuf;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The single recorder this server drives
    pub controller: Arc<RecordingSessionController>,

    /// Last notification, for status queries
    pub board: Arc<StatusBoard>,

    /// Where recordings go when the request names no path
    pub output_dir: PathBuf,
}

impl AppState {
    pub fn new(
        controller: Arc<RecordingSessionController>,
        board: Arc<StatusBoard>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            controller,
            board,
            output_dir: output_dir.into(),
        }
    }
}
