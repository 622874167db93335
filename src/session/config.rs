use std::time::Duration;

/// Encoder output marking that capture has begun
pub const DEFAULT_READY_PATTERN: &str = "Press [q] to stop";

/// Encoder output counted as a transient fault
pub const DEFAULT_FAULT_PATTERN: &str = "    Last message repeated";

/// Configuration for a recording session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Capture frame rate passed to the screen input
    pub fps: u32,

    /// Line substring that moves the session to Recording
    pub ready_pattern: String,

    /// Line substring recorded as a fault
    pub fault_pattern: String,

    /// Bytes written to the encoder's stdin to end the recording
    pub stop_input: String,

    /// Number of faults that must fit in `fault_window` to abort
    /// Default: 90
    pub fault_window_capacity: usize,

    /// Default: 15 seconds
    pub fault_window: Duration,

    /// Period of elapsed-time notifications
    pub tick_interval: Duration,

    /// Upper bound for the device listing probe
    pub probe_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            fps: 10,
            ready_pattern: DEFAULT_READY_PATTERN.to_string(),
            fault_pattern: DEFAULT_FAULT_PATTERN.to_string(),
            stop_input: "q".to_string(),
            fault_window_capacity: 90,
            fault_window: Duration::from_secs(15),
            tick_interval: Duration::from_secs(1),
            probe_timeout: Duration::from_secs(30),
        }
    }
}
