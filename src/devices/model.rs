use serde::{Deserialize, Serialize};

/// One capture source as reported by the platform capture backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureDevice {
    /// Index among devices sharing the same friendly name
    pub index: u32,
    /// Friendly name, used verbatim as the encoder input
    pub name: String,
}

impl CaptureDevice {
    pub fn new(index: u32, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
        }
    }
}

/// Devices found by one probe, in probe output order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCatalog {
    pub video_devices: Vec<CaptureDevice>,
    pub audio_devices: Vec<CaptureDevice>,
}

impl DeviceCatalog {
    /// Last listed video device with exactly this name
    pub fn last_video_named(&self, name: &str) -> Option<&CaptureDevice> {
        self.video_devices.iter().rev().find(|d| d.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.video_devices.is_empty() && self.audio_devices.is_empty()
    }
}
