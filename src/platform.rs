//! Platform selection
//!
//! Each supported platform maps to a fixed pair of device enumerator and
//! command builder. The pair is picked from [`STRATEGIES`] by
//! [`PlatformKind`], once per session start.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::command::{AvFoundationCommandBuilder, CommandBuilder, DirectShowCommandBuilder};
use crate::devices::{AvFoundationEnumerator, DeviceEnumerator, DirectShowEnumerator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformKind {
    /// DirectShow capture
    Windows,
    /// AVFoundation capture
    MacOs,
}

impl PlatformKind {
    /// Platform of the running host, Windows layout when unknown
    pub fn host() -> Self {
        if cfg!(target_os = "macos") {
            PlatformKind::MacOs
        } else {
            PlatformKind::Windows
        }
    }
}

impl Default for PlatformKind {
    fn default() -> Self {
        Self::host()
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformKind::Windows => write!(f, "windows"),
            PlatformKind::MacOs => write!(f, "macos"),
        }
    }
}

/// Host facts the recorder needs, resolved outside this crate
pub trait PlatformParameters: Send + Sync {
    /// Location of the encoder binary
    fn encoder_binary(&self) -> PathBuf;

    /// Which capture backend to drive
    fn platform(&self) -> PlatformKind;
}

/// Fixed platform parameters, usually taken from configuration
#[derive(Debug, Clone)]
pub struct StaticPlatform {
    pub encoder_binary: PathBuf,
    pub platform: PlatformKind,
}

impl PlatformParameters for StaticPlatform {
    fn encoder_binary(&self) -> PathBuf {
        self.encoder_binary.clone()
    }

    fn platform(&self) -> PlatformKind {
        self.platform
    }
}

/// Device enumerator and command builder for one capture backend
pub struct CaptureStrategy {
    pub enumerator: Box<dyn DeviceEnumerator>,
    pub builder: Box<dyn CommandBuilder>,
}

type StrategyFactory = fn(Duration) -> CaptureStrategy;

/// Strategy table, keyed by platform
pub const STRATEGIES: &[(PlatformKind, StrategyFactory)] = &[
    (PlatformKind::Windows, directshow_strategy),
    (PlatformKind::MacOs, avfoundation_strategy),
];

impl CaptureStrategy {
    /// Pair registered for `kind`; `probe_timeout` bounds device listing
    pub fn for_platform(kind: PlatformKind, probe_timeout: Duration) -> Self {
        let factory = STRATEGIES
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, factory)| *factory)
            .unwrap_or(directshow_strategy);
        factory(probe_timeout)
    }
}

fn directshow_strategy(probe_timeout: Duration) -> CaptureStrategy {
    CaptureStrategy {
        enumerator: Box::new(DirectShowEnumerator::new(probe_timeout)),
        builder: Box::new(DirectShowCommandBuilder),
    }
}

fn avfoundation_strategy(probe_timeout: Duration) -> CaptureStrategy {
    CaptureStrategy {
        enumerator: Box::new(AvFoundationEnumerator::new(probe_timeout)),
        builder: Box::new(AvFoundationCommandBuilder),
    }
}
