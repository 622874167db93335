use std::io;
use thiserror::Error;

use crate::session::SessionState;

/// Errors surfaced by the recording core
#[derive(Debug, Error)]
pub enum RecorderError {
    /// Device probing failed: unexpected exit code, malformed listing or timeout
    #[error("Device probe failed: {0}")]
    Probe(String),

    /// The encoder process could not be created
    #[error("Failed to launch encoder: {0}")]
    Launch(#[source] io::Error),

    /// Too many fault lines inside the configured window
    #[error("Too many errors in last {window_secs} seconds (counted {faults} errors)")]
    FaultStorm { faults: usize, window_secs: u64 },

    /// A session is already live
    #[error("Cannot start recording while session is {0}")]
    InvalidState(SessionState),

    /// No encoder process to stop
    #[error("No recording process is running")]
    NotRunning,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type RecorderResult<T> = Result<T, RecorderError>;
