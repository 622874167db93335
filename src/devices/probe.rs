use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{RecorderError, RecorderResult};

/// Exit code the encoder returns after printing a device listing
pub const EXPECTED_LISTING_EXIT_CODE: i32 = 1;

/// Captured result of a probe invocation
#[derive(Debug, Clone)]
pub struct ProbeOutput {
    /// Exit code, `None` when the probe was terminated by a signal
    pub exit_code: Option<i32>,
    /// Diagnostic (stderr) text
    pub diagnostics: String,
}

impl ProbeOutput {
    /// Diagnostic text, if the probe exited with the listing code
    pub fn listing(&self) -> RecorderResult<&str> {
        if self.exit_code != Some(EXPECTED_LISTING_EXIT_CODE) {
            return Err(RecorderError::Probe(format!(
                "Error while listing devices. Exit code: {}",
                self.exit_code
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "none".to_string())
            )));
        }
        Ok(&self.diagnostics)
    }
}

/// Run the encoder with probe arguments and capture its diagnostics in full
///
/// The child is killed if it outlives `timeout`.
pub async fn run_probe(encoder: &Path, args: &[&str], timeout: Duration) -> RecorderResult<ProbeOutput> {
    info!("Executing {} {}", encoder.display(), args.join(" "));

    let child = Command::new(encoder)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| RecorderError::Probe(format!("Cannot run {}: {}", encoder.display(), e)))?;

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| {
            RecorderError::Probe(format!(
                "Probe did not finish within {} seconds",
                timeout.as_secs()
            ))
        })?
        .map_err(|e| RecorderError::Probe(format!("Failed to collect probe output: {}", e)))?;

    let diagnostics = String::from_utf8_lossy(&output.stderr).into_owned();
    debug!("Probe stderr:\n{}", diagnostics);
    debug!("Probe stdout:\n{}", String::from_utf8_lossy(&output.stdout));

    Ok(ProbeOutput {
        exit_code: output.status.code(),
        diagnostics,
    })
}
