//! Shell command execution in the project folder.

use std::{path::PathBuf, process::Stdio, sync::Arc};

use async_trait::async_trait;
use gesture_commit_core::{CommandExecutor, CommandOutput, SettingsKey, SettingsStore, get_typed};
use tokio::process::Command;
use tracing::{info, instrument, warn};

/// Exit code reported when the shell could not be started.
pub const SPAWN_FAILED_EXIT_CODE: i32 = -1;

/// Runs commands through the platform shell.
pub struct ShellExecutor {
    settings: Arc<dyn SettingsStore>,
}

impl ShellExecutor {
    /// Executor that runs in the configured project folder, when there is one.
    pub fn new(settings: Arc<dyn SettingsStore>) -> Self {
        Self { settings }
    }
}

fn shell(command: &str) -> Command {
    #[cfg(windows)]
    {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(command);
        cmd
    }
    #[cfg(not(windows))]
    {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        cmd
    }
}

#[async_trait]
impl CommandExecutor for ShellExecutor {
    #[instrument(skip(self))]
    async fn execute(&self, command: &str) -> CommandOutput {
        let folder: Option<PathBuf> =
            get_typed(self.settings.as_ref(), &SettingsKey::ProjectFolder).await;

        let mut cmd = shell(command);
        cmd.stdin(Stdio::null());
        if let Some(folder) = folder.as_ref().filter(|f| f.is_dir()) {
            cmd.current_dir(folder);
        }

        match cmd.output().await {
            Ok(output) => {
                let exit_code = output.status.code().unwrap_or(SPAWN_FAILED_EXIT_CODE);
                info!(exit_code, "Command finished");
                CommandOutput {
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                    exit_code,
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to start shell");
                CommandOutput {
                    stdout: String::new(),
                    stderr: e.to_string(),
                    exit_code: SPAWN_FAILED_EXIT_CODE,
                }
            }
        }
    }
}
