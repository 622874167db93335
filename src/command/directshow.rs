use std::path::Path;
use tracing::info;

use super::{assemble, mix_clause, CommandBuilder};
use crate::devices::DeviceCatalog;

/// Preferred screen capture filter
pub const U_SCREEN_CAPTURE: &str = "UScreenCapture";

/// Fallback screen capture filter
pub const SCREEN_CAPTURE_RECORDER: &str = "screen-capture-recorder";

/// DirectShow recording command
///
/// Every audio device becomes an input, all of them mixed into one track.
/// Video comes from a single screen capture filter; without one the recording
/// is audio only.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectShowCommandBuilder;

impl CommandBuilder for DirectShowCommandBuilder {
    fn build(&self, catalog: &DeviceCatalog, encoder: &Path, output: &Path, fps: u32) -> Vec<String> {
        let mut inputs = Vec::new();

        for device in &catalog.audio_devices {
            inputs.extend([
                "-f".to_string(),
                "dshow".to_string(),
                "-audio_device_number".to_string(),
                device.index.to_string(),
                "-i".to_string(),
                format!("audio={}", device.name),
            ]);
        }
        inputs.extend(mix_clause(catalog.audio_devices.len()));

        let screen = catalog
            .last_video_named(U_SCREEN_CAPTURE)
            .or_else(|| catalog.last_video_named(SCREEN_CAPTURE_RECORDER));
        match screen {
            Some(device) => {
                info!("Using {}", device.name);
                inputs.extend([
                    "-f".to_string(),
                    "dshow".to_string(),
                    "-framerate".to_string(),
                    fps.to_string(),
                    "-video_device_number".to_string(),
                    device.index.to_string(),
                    "-i".to_string(),
                    format!("video={}", device.name),
                ]);
            }
            None => info!("No screen capture device found, recording audio only"),
        }

        assemble(encoder, inputs, output)
    }
}
