use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::platform::{PlatformKind, StaticPlatform};
use crate::session::{CommandExtension, SessionConfig, DEFAULT_FAULT_PATTERN, DEFAULT_READY_PATTERN};

/// Prefix of environment overrides, e.g. `SCREEN_RECORDER__ENCODER__BINARY_PATH`
pub const ENV_PREFIX: &str = "SCREEN_RECORDER";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub encoder: EncoderConfig,
    pub recording: RecordingConfig,
    pub faults: FaultConfig,
    pub process: ProcessConfig,
    pub http: HttpConfig,
    pub extension: Option<ExtensionConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    pub binary_path: PathBuf,
    pub platform: PlatformKind,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            binary_path: PathBuf::from("ffmpeg"),
            platform: PlatformKind::host(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    pub output_dir: PathBuf,
    pub fps: u32,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            output_dir: std::env::temp_dir(),
            fps: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FaultConfig {
    pub pattern: String,
    pub window_capacity: usize,
    pub window_secs: u64,
}

impl Default for FaultConfig {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_FAULT_PATTERN.to_string(),
            window_capacity: 90,
            window_secs: 15,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProcessConfig {
    pub ready_pattern: String,
    pub stop_input: String,
    pub tick_interval_ms: u64,
    pub probe_timeout_secs: u64,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            ready_pattern: DEFAULT_READY_PATTERN.to_string(),
            stop_input: "q".to_string(),
            tick_interval_ms: 1000,
            probe_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 7878,
        }
    }
}

/// External program run on every finished recording
#[derive(Debug, Clone, Deserialize)]
pub struct ExtensionConfig {
    pub program: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Config {
    /// Load `path` (extension optional, file optional) plus environment overrides
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path))?;

        settings
            .try_deserialize()
            .context("Invalid recorder configuration")
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            fps: self.recording.fps,
            ready_pattern: self.process.ready_pattern.clone(),
            fault_pattern: self.faults.pattern.clone(),
            stop_input: self.process.stop_input.clone(),
            fault_window_capacity: self.faults.window_capacity,
            fault_window: Duration::from_secs(self.faults.window_secs),
            tick_interval: Duration::from_millis(self.process.tick_interval_ms.max(1)),
            probe_timeout: Duration::from_secs(self.process.probe_timeout_secs),
        }
    }

    pub fn platform(&self) -> StaticPlatform {
        StaticPlatform {
            encoder_binary: self.encoder.binary_path.clone(),
            platform: self.encoder.platform,
        }
    }

    pub fn extension(&self) -> Option<CommandExtension> {
        self.extension
            .as_ref()
            .map(|ext| CommandExtension::new(ext.program.clone(), ext.args.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults_follow_reference_policy() {
        let config = Config::default();
        let session = config.session_config();

        assert_eq!(session.fps, 10);
        assert_eq!(session.fault_window_capacity, 90);
        assert_eq!(session.fault_window, Duration::from_secs(15));
        assert_eq!(session.ready_pattern, "Press [q] to stop");
        assert_eq!(session.fault_pattern, "    Last message repeated");
        assert_eq!(session.stop_input, "q");
        assert_eq!(session.tick_interval, Duration::from_secs(1));
        assert!(config.extension().is_none());
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recorder.toml");
        fs::write(
            &path,
            r#"
[encoder]
binary_path = "C:\\recorder\\bin-windows-1.0\\ffmpeg.exe"
platform = "windows"

[faults]
window_capacity = 30

[extension]
program = "/usr/local/bin/upload"
args = ["--bucket", "videos"]
"#,
        )
        .unwrap();

        let config = Config::load(path.to_str().unwrap()).unwrap();

        assert_eq!(config.encoder.platform, PlatformKind::Windows);
        assert_eq!(
            config.platform().encoder_binary,
            PathBuf::from("C:\\recorder\\bin-windows-1.0\\ffmpeg.exe")
        );
        assert_eq!(config.faults.window_capacity, 30);
        assert_eq!(config.faults.window_secs, 15);
        assert_eq!(config.recording.fps, 10);
        let extension = config.extension.as_ref().unwrap();
        assert_eq!(extension.args, vec!["--bucket", "videos"]);
    }

    #[test]
    fn test_zero_tick_interval_is_raised() {
        let mut config = Config::default();
        config.process.tick_interval_ms = 0;

        assert_eq!(config.session_config().tick_interval, Duration::from_millis(1));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent");

        let config = Config::load(path.to_str().unwrap()).unwrap();

        assert_eq!(config.http.port, 7878);
        assert_eq!(config.process.probe_timeout_secs, 30);
    }
}
