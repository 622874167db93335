// DirectShow (Windows) device listing
//
// ffmpeg prints one quoted friendly name per device. Devices exposing several
// pins under the same name are collapsed by ffmpeg's log deduplication into a
// "Last message repeated <k> times" line, which expands back into k more
// entries with increasing device numbers.

use async_trait::async_trait;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{error, info, warn};

use super::model::{CaptureDevice, DeviceCatalog};
use super::probe::run_probe;
use super::DeviceEnumerator;
use crate::error::{RecorderError, RecorderResult};

/// Marker delimiting the video and audio parts of the listing
pub const SECTION_MARKER: &str = "DirectShow";

pub const PROBE_ARGS: [&str; 6] = ["-list_devices", "true", "-f", "dshow", "-i", "dummy"];

/// Upper bound on one "repeated <k> times" expansion
pub const MAX_REPEAT: u32 = 256;

/// Friendly name: everything between the first and the last double quote
static QUOTED_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""(.+)""#).expect("quoted name pattern"));

static REPEAT_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"repeated (\d+) times").expect("repeat count pattern"));

pub struct DirectShowEnumerator {
    probe_timeout: Duration,
}

impl DirectShowEnumerator {
    pub fn new(probe_timeout: Duration) -> Self {
        Self { probe_timeout }
    }
}

#[async_trait]
impl DeviceEnumerator for DirectShowEnumerator {
    async fn enumerate(&self, encoder: &Path) -> RecorderResult<DeviceCatalog> {
        let output = run_probe(encoder, &PROBE_ARGS, self.probe_timeout).await?;
        parse_listing(output.listing()?)
    }

    fn name(&self) -> &str {
        "dshow"
    }
}

/// Parse DirectShow diagnostics into a catalog
///
/// Part 1 of the text split on [`SECTION_MARKER`] holds video devices, part 2
/// audio devices. Anything after is ignored.
pub fn parse_listing(text: &str) -> RecorderResult<DeviceCatalog> {
    let mut parts: Vec<&str> = text.split(SECTION_MARKER).collect();
    // Trailing empty parts do not count as sections
    while parts.last().is_some_and(|part| part.is_empty()) {
        parts.pop();
    }
    if parts.len() < 3 {
        for (i, part) in parts.iter().enumerate() {
            error!("Part {}: {}", i, part);
        }
        return Err(RecorderError::Probe(format!(
            "Error splitting output. Number of parts: {}. Expected at least 3 parts.",
            parts.len()
        )));
    }

    info!("Parsing video devices");
    let video_devices = parse_section(parts[1]);
    info!("Parsing audio devices");
    let audio_devices = parse_section(parts[2]);

    Ok(DeviceCatalog {
        video_devices,
        audio_devices,
    })
}

fn parse_section(section: &str) -> Vec<CaptureDevice> {
    let mut devices: Vec<CaptureDevice> = Vec::new();
    let mut index = 0u32;

    for line in section.lines() {
        // Moniker printed under each friendly name, not a device
        if line.contains("Alternative name") {
            continue;
        }

        if let Some(caps) = QUOTED_NAME.captures(line) {
            index = 0;
            devices.push(CaptureDevice::new(index, &caps[1]));
        } else if let Some(caps) = REPEAT_COUNT.captures(line) {
            let times = match caps[1].parse::<u32>() {
                Ok(times) if times <= MAX_REPEAT => times,
                _ => {
                    warn!("Ignoring implausible repeat count: {}", line.trim());
                    continue;
                }
            };
            let Some(previous) = devices.last().map(|d| d.name.clone()) else {
                warn!("Ignoring repeat line with no preceding device: {}", line.trim());
                continue;
            };
            for _ in 0..times {
                index += 1;
                devices.push(CaptureDevice::new(index, previous.clone()));
            }
        }
    }

    info!("Found {} devices.", devices.len());
    devices
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"ffmpeg version N-61041-g52a2138 Copyright (c) 2000-2014 the FFmpeg developers
[dshow @ 00000000003bcd60] DirectShow video devices
[dshow @ 00000000003bcd60]  "UScreenCapture"
[dshow @ 00000000003bcd60]  "screen-capture-recorder"
[dshow @ 00000000003bcd60] DirectShow audio devices
[dshow @ 00000000003bcd60]  "Microphone (Realtek High Definition Audio)"
[dshow @ 00000000003bcd60]  "virtual-audio-capturer"
dummy: Immediate exit requested
"#;

    #[test]
    fn test_parse_listing_splits_video_and_audio() {
        let catalog = parse_listing(LISTING).unwrap();

        assert_eq!(
            catalog.video_devices,
            vec![
                CaptureDevice::new(0, "UScreenCapture"),
                CaptureDevice::new(0, "screen-capture-recorder"),
            ]
        );
        assert_eq!(
            catalog.audio_devices,
            vec![
                CaptureDevice::new(0, "Microphone (Realtek High Definition Audio)"),
                CaptureDevice::new(0, "virtual-audio-capturer"),
            ]
        );
    }

    #[test]
    fn test_repeated_line_expands_previous_device() {
        let text = "header DirectShow video devices\n\
                    [dshow @ 1]  \"Webcam\"\n\
                    [dshow @ 1]     Last message repeated 3 times\n\
                    DirectShow audio devices\n";

        let catalog = parse_listing(text).unwrap();

        assert_eq!(catalog.video_devices.len(), 4);
        assert!(catalog.video_devices.iter().all(|d| d.name == "Webcam"));
        let indexes: Vec<u32> = catalog.video_devices.iter().map(|d| d.index).collect();
        assert_eq!(indexes, vec![0, 1, 2, 3]);
        assert!(catalog.audio_devices.is_empty());
    }

    #[test]
    fn test_new_name_resets_index() {
        let text = "DirectShow video\n\
                    \"A\"\n\
                    Last message repeated 1 times\n\
                    \"B\"\n\
                    Last message repeated 2 times\n\
                    DirectShow audio\n";

        let catalog = parse_listing(text).unwrap();

        assert_eq!(
            catalog.video_devices,
            vec![
                CaptureDevice::new(0, "A"),
                CaptureDevice::new(1, "A"),
                CaptureDevice::new(0, "B"),
                CaptureDevice::new(1, "B"),
                CaptureDevice::new(2, "B"),
            ]
        );
    }

    #[test]
    fn test_repeat_without_device_is_ignored() {
        let text = "DirectShow video\nLast message repeated 5 times\n\"Cam\"\nDirectShow audio\n";

        let catalog = parse_listing(text).unwrap();

        assert_eq!(catalog.video_devices, vec![CaptureDevice::new(0, "Cam")]);
    }

    #[test]
    fn test_too_few_sections_fails() {
        for text in ["", "no marker at all", "DirectShow video devices \"Cam\""] {
            assert!(
                matches!(parse_listing(text), Err(RecorderError::Probe(_))),
                "expected probe failure for {:?}",
                text
            );
        }
    }

    #[test]
    fn test_sections_after_audio_are_ignored() {
        let text = "DirectShow video\n\"V\"\nDirectShow audio\n\"A\"\nDirectShow extra\n\"X\"\n";

        let catalog = parse_listing(text).unwrap();

        assert_eq!(catalog.video_devices, vec![CaptureDevice::new(0, "V")]);
        assert_eq!(catalog.audio_devices, vec![CaptureDevice::new(0, "A")]);
    }

    #[test]
    fn test_alternative_name_lines_skipped() {
        let text = "DirectShow video devices\n\
                    [dshow @ 2]  \"Integrated Camera\"\n\
                    [dshow @ 2]     Alternative name \"@device_pnp_\\\\?\\usb#vid_04f2\"\n\
                    DirectShow audio devices\n";

        let catalog = parse_listing(text).unwrap();

        assert_eq!(catalog.video_devices, vec![CaptureDevice::new(0, "Integrated Camera")]);
    }

    #[test]
    fn test_name_spans_first_to_last_quote() {
        let text = "DirectShow video\n\
                    [dshow]  \"Mic \"Pro\"\"\n\
                    only \"one quote\n\
                    empty \"\"\n\
                    DirectShow audio\n";

        let catalog = parse_listing(text).unwrap();

        assert_eq!(catalog.video_devices, vec![CaptureDevice::new(0, r#"Mic "Pro""#)]);
    }

    #[test]
    fn test_malformed_repeat_lines_ignored() {
        let text = "DirectShow video\n\
                    \"Cam\"\n\
                    Last message repeated times\n\
                    Last message repeated 3 time\n\
                    Last message repeated 4000000000 times\n\
                    Last message repeated 99999999999 times\n\
                    Last message repeated 12 times\n\
                    DirectShow audio\n";

        let catalog = parse_listing(text).unwrap();

        assert_eq!(catalog.video_devices.len(), 13);
        assert_eq!(catalog.video_devices.last(), Some(&CaptureDevice::new(12, "Cam")));
    }

    #[test]
    fn test_trailing_marker_is_not_a_section() {
        let text = "header DirectShow video \"V\" DirectShow";

        assert!(matches!(parse_listing(text), Err(RecorderError::Probe(_))));
    }

    #[test]
    fn test_empty_audio_section_between_markers_counts() {
        let text = "DirectShow video\n\"V\"\nDirectShowDirectShow tail";

        let catalog = parse_listing(text).unwrap();

        assert_eq!(catalog.video_devices, vec![CaptureDevice::new(0, "V")]);
        assert!(catalog.audio_devices.is_empty());
    }
}
