use std::path::{Path, PathBuf};

use tokio::process::Command;

use crate::error::Error;

/// Handle on the external OLIVE engine.
///
/// Runs `<command> -i <input> <workflow>` and hands back raw stdout, banner
/// and all; [`crate::parse_report`] deals with the framing. The input path is
/// canonicalized first because the engine resolves paths against its own
/// working directory, not ours.
#[derive(Debug, Clone)]
pub struct Engine {
    command: String,
    workflow: PathBuf,
}

impl Engine {
    pub fn new(command: impl Into<String>, workflow: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            workflow: workflow.into(),
        }
    }

    pub async fn run(&self, input: &Path) -> Result<String, Error> {
        let input = input.canonicalize()?;
        tracing::debug!(
            command = %self.command,
            input = %input.display(),
            "running olive workflow"
        );

        let output = Command::new(&self.command)
            .arg("-i")
            .arg(&input)
            .arg(&self.workflow)
            .output()
            .await?;

        if !output.status.success() {
            return Err(Error::EngineFailed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
