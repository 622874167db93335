use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Lifecycle of one recording session
///
/// Transitions only move forward: Idle -> PreRecording -> Recording, and any
/// live state may end in Completed or Fatal. Nothing leaves a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    /// Encoder command being prepared or process starting
    PreRecording,
    /// Encoder reported it is capturing
    Recording,
    Completed,
    Fatal,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Fatal)
    }

    pub fn is_live(self) -> bool {
        matches!(self, SessionState::PreRecording | SessionState::Recording)
    }

    fn rank(self) -> u8 {
        match self {
            SessionState::Idle => 0,
            SessionState::PreRecording => 1,
            SessionState::Recording => 2,
            SessionState::Completed | SessionState::Fatal => 3,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::PreRecording => "pre-recording",
            SessionState::Recording => "recording",
            SessionState::Completed => "completed",
            SessionState::Fatal => "fatal",
        };
        f.write_str(name)
    }
}

/// Snapshot of a recording session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingSession {
    pub state: SessionState,
    pub output_path: PathBuf,
    pub started_at: DateTime<Utc>,
    /// Seconds counted since the encoder reported it is capturing
    pub elapsed_seconds: u64,
}

impl RecordingSession {
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            state: SessionState::Idle,
            output_path: output_path.into(),
            started_at: Utc::now(),
            elapsed_seconds: 0,
        }
    }

    /// Move to `next` if that is a forward transition; returns whether it happened
    pub fn advance(&mut self, next: SessionState) -> bool {
        if self.state.is_terminal() || next.rank() <= self.state.rank() {
            return false;
        }
        self.state = next;
        true
    }

    /// Elapsed time as `MM:SS`
    pub fn elapsed_display(&self) -> String {
        format_elapsed(self.elapsed_seconds)
    }
}

/// `MM:SS`, minutes keep growing past 99
pub fn format_elapsed(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions() {
        let mut session = RecordingSession::new("/tmp/out.mp4");
        assert_eq!(session.state, SessionState::Idle);

        assert!(session.advance(SessionState::PreRecording));
        assert!(session.advance(SessionState::Recording));
        assert!(session.advance(SessionState::Completed));
        assert_eq!(session.state, SessionState::Completed);
    }

    #[test]
    fn test_no_backward_or_terminal_exit() {
        let mut session = RecordingSession::new("out.mp4");
        session.advance(SessionState::PreRecording);
        session.advance(SessionState::Recording);

        assert!(!session.advance(SessionState::PreRecording));
        assert!(!session.advance(SessionState::Recording));

        assert!(session.advance(SessionState::Fatal));
        assert!(!session.advance(SessionState::Completed));
        assert_eq!(session.state, SessionState::Fatal);
    }

    #[test]
    fn test_exit_before_ready_completes() {
        let mut session = RecordingSession::new("out.mp4");
        session.advance(SessionState::PreRecording);

        assert!(session.advance(SessionState::Completed));
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(0), "00:00");
        assert_eq!(format_elapsed(9), "00:09");
        assert_eq!(format_elapsed(61), "01:01");
        assert_eq!(format_elapsed(600), "10:00");
        assert_eq!(format_elapsed(6000), "100:00");
    }

    #[test]
    fn test_state_flags() {
        assert!(SessionState::Recording.is_live());
        assert!(!SessionState::Idle.is_live());
        assert!(SessionState::Fatal.is_terminal());
        assert!(!SessionState::PreRecording.is_terminal());
    }
}
