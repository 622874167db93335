//! Capture device discovery
//!
//! The encoder is run in listing mode and its diagnostic text is parsed into a
//! [`DeviceCatalog`]. Each capture backend prints a different layout:
//! - DirectShow (Windows): quoted names split into video/audio sections
//! - AVFoundation (macOS): indexed names under per-kind headers

pub mod avfoundation;
pub mod directshow;
mod model;
pub mod probe;

use async_trait::async_trait;
use std::path::Path;

use crate::error::RecorderResult;

pub use avfoundation::AvFoundationEnumerator;
pub use directshow::DirectShowEnumerator;
pub use model::{CaptureDevice, DeviceCatalog};
pub use probe::{ProbeOutput, EXPECTED_LISTING_EXIT_CODE};

/// Lists the capture devices a backend exposes
#[async_trait]
pub trait DeviceEnumerator: Send + Sync {
    /// Probe `encoder` and parse its device listing
    async fn enumerate(&self, encoder: &Path) -> RecorderResult<DeviceCatalog>;

    /// Backend name for logging
    fn name(&self) -> &str;
}
