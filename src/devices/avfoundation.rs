// AVFoundation (macOS) device listing
//
// Each device is printed as "[<n>] <name>" after the log prefix, below an
// "AVFoundation video devices:" or "AVFoundation audio devices:" header.

use async_trait::async_trait;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::info;

use super::model::{CaptureDevice, DeviceCatalog};
use super::probe::run_probe;
use super::DeviceEnumerator;
use crate::error::{RecorderError, RecorderResult};

pub const VIDEO_HEADER: &str = "AVFoundation video devices:";
pub const AUDIO_HEADER: &str = "AVFoundation audio devices:";

pub const PROBE_ARGS: [&str; 6] = ["-list_devices", "true", "-f", "avfoundation", "-i", ""];

static INDEXED_ENTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\d+)\] (.+)").expect("indexed entry pattern"));

pub struct AvFoundationEnumerator {
    probe_timeout: Duration,
}

impl AvFoundationEnumerator {
    pub fn new(probe_timeout: Duration) -> Self {
        Self { probe_timeout }
    }
}

#[async_trait]
impl DeviceEnumerator for AvFoundationEnumerator {
    async fn enumerate(&self, encoder: &Path) -> RecorderResult<DeviceCatalog> {
        let output = run_probe(encoder, &PROBE_ARGS, self.probe_timeout).await?;
        parse_listing(output.listing()?)
    }

    fn name(&self) -> &str {
        "avfoundation"
    }
}

enum Section {
    Preamble,
    Video,
    Audio,
}

pub fn parse_listing(text: &str) -> RecorderResult<DeviceCatalog> {
    if !text.contains(VIDEO_HEADER) {
        return Err(RecorderError::Probe(format!(
            "Listing does not contain '{}'",
            VIDEO_HEADER
        )));
    }

    let mut catalog = DeviceCatalog::default();
    let mut section = Section::Preamble;

    for line in text.lines() {
        if line.contains(VIDEO_HEADER) {
            section = Section::Video;
            continue;
        }
        if line.contains(AUDIO_HEADER) {
            section = Section::Audio;
            continue;
        }

        let Some((index, name)) = indexed_entry(line) else {
            continue;
        };
        match section {
            Section::Video => catalog.video_devices.push(CaptureDevice::new(index, name)),
            Section::Audio => catalog.audio_devices.push(CaptureDevice::new(index, name)),
            Section::Preamble => {}
        }
    }

    info!(
        "Found {} video and {} audio devices.",
        catalog.video_devices.len(),
        catalog.audio_devices.len()
    );

    Ok(catalog)
}

/// `(n, name)` from the first "[<n>] <name>" fragment of the line
fn indexed_entry(line: &str) -> Option<(u32, &str)> {
    let caps = INDEXED_ENTRY.captures(line)?;
    let index = caps.get(1)?.as_str().parse::<u32>().ok()?;
    let name = caps.get(2)?.as_str().trim_end();
    (!name.is_empty()).then_some((index, name))
}
