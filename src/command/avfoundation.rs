use std::path::Path;
use tracing::info;

use super::{assemble, mix_clause, CommandBuilder};
use crate::devices::DeviceCatalog;

/// Name prefix of the screen devices AVFoundation exposes
pub const SCREEN_DEVICE_PREFIX: &str = "Capture screen";

/// AVFoundation recording command
#[derive(Debug, Default, Clone, Copy)]
pub struct AvFoundationCommandBuilder;

impl CommandBuilder for AvFoundationCommandBuilder {
    fn build(&self, catalog: &DeviceCatalog, encoder: &Path, output: &Path, fps: u32) -> Vec<String> {
        let mut inputs = Vec::new();

        for device in &catalog.audio_devices {
            inputs.extend([
                "-f".to_string(),
                "avfoundation".to_string(),
                "-i".to_string(),
                format!(":{}", device.index),
            ]);
        }
        inputs.extend(mix_clause(catalog.audio_devices.len()));

        let screen = catalog
            .video_devices
            .iter()
            .find(|d| d.name.starts_with(SCREEN_DEVICE_PREFIX));
        match screen {
            Some(device) => {
                info!("Using {}", device.name);
                inputs.extend([
                    "-f".to_string(),
                    "avfoundation".to_string(),
                    "-framerate".to_string(),
                    fps.to_string(),
                    "-capture_cursor".to_string(),
                    "1".to_string(),
                    "-i".to_string(),
                    format!("{}:none", device.index),
                ]);
            }
            None => info!("No screen capture device found, recording audio only"),
        }

        assemble(encoder, inputs, output)
    }
}
