pub mod command;
pub mod config;
pub mod devices;
pub mod error;
pub mod http;
pub mod platform;
pub mod process;
pub mod session;

pub use command::CommandBuilder;
pub use config::Config;
pub use devices::{CaptureDevice, DeviceCatalog, DeviceEnumerator};
pub use error::{RecorderError, RecorderResult};
pub use http::{create_router, AppState};
pub use platform::{CaptureStrategy, PlatformKind, PlatformParameters, StaticPlatform};
pub use session::{
    ChannelSink, CommandExtension, ExtensionHook, FanOut, LoggingSink, Notification,
    NotificationSink, NotificationType, RecordingSession, RecordingSessionController,
    SessionConfig, SessionState, StatusBoard,
};
