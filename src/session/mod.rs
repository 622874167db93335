//! Recording session management
//!
//! This module provides the [`RecordingSessionController`] that manages:
//! - Device probing and encoder command assembly per platform
//! - The encoder child process and its stdin/stdout/stderr
//! - State transitions driven by encoder output
//! - Fault-storm detection and forced stop
//! - Lifecycle notifications and the post-recording extension hook

mod config;
mod controller;
mod extension;
mod notify;
mod state;

pub use config::{SessionConfig, DEFAULT_FAULT_PATTERN, DEFAULT_READY_PATTERN};
pub use controller::RecordingSessionController;
pub use extension::{CommandExtension, ExtensionHook};
pub use notify::{
    ChannelSink, FanOut, LoggingSink, Notification, NotificationSink, NotificationType, StatusBoard,
};
pub use state::{format_elapsed, RecordingSession, SessionState};
