use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::RwLock;
use tokio::sync::mpsc;
use tracing::{error, info};

/// Lifecycle events reported to the embedding application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    PreRecording,
    /// Capture started; repeated every tick with the elapsed time
    Recording,
    Completed,
    Fatal,
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NotificationType::PreRecording => "PRE_RECORDING",
            NotificationType::Recording => "RECORDING",
            NotificationType::Completed => "COMPLETED",
            NotificationType::Fatal => "FATAL",
        };
        f.write_str(name)
    }
}

/// Receives session lifecycle notifications
///
/// Called while the session state is locked, so implementations must return
/// quickly and must not call back into the controller.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, kind: NotificationType, message: &str);
}

impl<F> NotificationSink for F
where
    F: Fn(NotificationType, &str) + Send + Sync,
{
    fn notify(&self, kind: NotificationType, message: &str) {
        self(kind, message)
    }
}

/// A delivered notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationType,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl Notification {
    pub fn new(kind: NotificationType, message: &str) -> Self {
        Self {
            kind,
            message: message.to_string(),
            at: Utc::now(),
        }
    }
}

/// Writes notifications to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSink;

impl NotificationSink for LoggingSink {
    fn notify(&self, kind: NotificationType, message: &str) {
        match kind {
            NotificationType::Fatal => error!("{}: {}", kind, message),
            _ => info!("{}: {}", kind, message),
        }
    }
}

/// Forwards notifications into an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl NotificationSink for ChannelSink {
    fn notify(&self, kind: NotificationType, message: &str) {
        // Receiver gone means nobody is listening any more
        let _ = self.tx.send(Notification::new(kind, message));
    }
}

/// Keeps the most recent notification for status queries
#[derive(Debug, Default)]
pub struct StatusBoard {
    last: RwLock<Option<Notification>>,
}

impl StatusBoard {
    pub fn last(&self) -> Option<Notification> {
        self.last.read().ok().and_then(|last| last.clone())
    }
}

impl NotificationSink for StatusBoard {
    fn notify(&self, kind: NotificationType, message: &str) {
        if let Ok(mut last) = self.last.write() {
            *last = Some(Notification::new(kind, message));
        }
    }
}

/// Delivers every notification to each inner sink in order
pub struct FanOut(pub Vec<std::sync::Arc<dyn NotificationSink>>);

impl NotificationSink for FanOut {
    fn notify(&self, kind: NotificationType, message: &str) {
        for sink in &self.0 {
            sink.notify(kind, message);
        }
    }
}
