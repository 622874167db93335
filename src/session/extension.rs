use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::info;

/// Post-processing step run on the finished recording
#[async_trait]
pub trait ExtensionHook: Send + Sync {
    async fn run(&self, output: &Path) -> Result<()>;
}

/// Runs an external program with the recording path as last argument
#[derive(Debug, Clone)]
pub struct CommandExtension {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandExtension {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

#[async_trait]
impl ExtensionHook for CommandExtension {
    async fn run(&self, output: &Path) -> Result<()> {
        info!(
            "Executing extension {} for {}",
            self.program.display(),
            output.display()
        );

        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(output)
            .status()
            .await
            .with_context(|| format!("Failed to run extension {}", self.program.display()))?;

        if !status.success() {
            bail!("Extension {} exited with {}", self.program.display(), status);
        }

        Ok(())
    }
}
