//! Building blocks for supervising the encoder process
//!
//! - [`StreamWatcher`]: line reader with substring-triggered callbacks
//! - [`ErrorStormDetector`]: sliding window over recent fault lines
//! - [`RecurringTimer`]: fixed-period callback task

mod storm;
mod timer;
mod watcher;

pub use storm::ErrorStormDetector;
pub use timer::RecurringTimer;
pub use watcher::StreamWatcher;
