//! Sequential action execution with continue-on-failure semantics.

use crate::{
    actions::{
        ActionError, ActionOutcome, ActionResult, ActionType, CommandExecutor, CommitClient,
        CommitRequest, ExecutionSummary, GestureAction, InputInjector,
    },
    protocol::GestureKind,
    settings::{self, DEFAULT_BASE_BRANCH, SettingsKey, SettingsStore},
};

use std::{panic::Location, path::PathBuf, sync::Arc};

use error_location::ErrorLocation;
use tracing::{debug, info, instrument, warn};

/// Runs a gesture's configured actions in order.
///
/// Every action is attempted even when an earlier one fails; later
/// actions may depend on the effects of earlier ones, so they never run
/// concurrently.
pub struct ActionRunner {
    commits: Arc<dyn CommitClient>,
    input: Arc<dyn InputInjector>,
    commands: Arc<dyn CommandExecutor>,
    settings: Arc<dyn SettingsStore>,
}

impl ActionRunner {
    /// Create a runner over the given collaborators.
    pub fn new(
        commits: Arc<dyn CommitClient>,
        input: Arc<dyn InputInjector>,
        commands: Arc<dyn CommandExecutor>,
        settings: Arc<dyn SettingsStore>,
    ) -> Self {
        Self {
            commits,
            input,
            commands,
            settings,
        }
    }

    /// Execute `actions` sequentially and summarize the outcomes.
    #[instrument(skip(self, actions), fields(gesture = %gesture, count = actions.len()))]
    pub async fn run(&self, gesture: GestureKind, actions: &[GestureAction]) -> ExecutionSummary {
        let mut results = Vec::with_capacity(actions.len());

        for (index, action) in actions.iter().enumerate() {
            let outcome = self.execute(gesture, action).await;

            match &outcome {
                Ok(_) => info!(index, action = %action.action_type, "Action succeeded"),
                Err(e) => warn!(index, action = %action.action_type, error = %e, "Action failed"),
            }

            results.push(ActionResult {
                action_id: action.id,
                action_type: action.action_type,
                outcome,
            });
        }

        let summary = ExecutionSummary { gesture, results };

        info!(
            total = summary.total_count(),
            succeeded = summary.success_count(),
            failed = summary.failure_count(),
            "Action run complete"
        );

        summary
    }

    async fn execute(
        &self,
        gesture: GestureKind,
        action: &GestureAction,
    ) -> Result<ActionOutcome, ActionError> {
        match action.action_type {
            ActionType::Commit => self.commit(gesture).await,
            ActionType::Shortcut => self.shortcut(action).await,
            ActionType::Command => self.command(action).await,
        }
    }

    async fn commit(&self, gesture: GestureKind) -> Result<ActionOutcome, ActionError> {
        let request = self.commit_request(gesture).await?;

        let branches =
            self.commits
                .branches(&request)
                .await
                .map_err(|source| ActionError::Commit {
                    source,
                    location: ErrorLocation::from(Location::caller()),
                })?;

        if !branches.iter().any(|b| *b == request.base_branch) {
            return Err(ActionError::Configuration {
                reason: format!(
                    "Base branch '{}' not found in {:?}",
                    request.base_branch, request.project_folder
                ),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let success = self
            .commits
            .send_commit_data(&request)
            .await
            .map_err(|source| ActionError::Commit {
                source,
                location: ErrorLocation::from(Location::caller()),
            })?;

        debug!(sha = %success.sha, branch = %success.branch, "Commit published");

        // The local stash is part of the commit action; failing it fails the action.
        self.commits
            .stash_changes(&request)
            .await
            .map_err(|source| ActionError::Stash {
                source,
                location: ErrorLocation::from(Location::caller()),
            })?;

        Ok(ActionOutcome::Committed(success))
    }

    async fn commit_request(&self, gesture: GestureKind) -> Result<CommitRequest, ActionError> {
        let store = self.settings.as_ref();

        let project_folder: PathBuf = settings::get_typed(store, &SettingsKey::ProjectFolder)
            .await
            .ok_or_else(|| ActionError::Configuration {
                reason: "No project folder configured".to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let base_branch = settings::get_typed::<String>(store, &SettingsKey::BaseBranch)
            .await
            .filter(|b| !b.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_BRANCH.to_string());

        let create_pull_request = settings::get_typed(store, &SettingsKey::CreatePullRequest)
            .await
            .unwrap_or(false);

        Ok(CommitRequest {
            project_folder,
            base_branch,
            create_pull_request,
            message: format!("Gesture commit ({})", gesture),
        })
    }

    async fn shortcut(&self, action: &GestureAction) -> Result<ActionOutcome, ActionError> {
        let Some(chord) = action.hotkey.as_ref() else {
            return Err(ActionError::Configuration {
                reason: "Shortcut action has no key chord".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        };

        if !self.input.has_permission().await {
            return Err(ActionError::PermissionDenied {
                reason: "Input injection (accessibility) permission not granted".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        self.input
            .send_chord(chord)
            .await
            .map_err(|source| ActionError::Shortcut {
                source,
                location: ErrorLocation::from(Location::caller()),
            })?;

        debug!(chord = %chord, "Shortcut sent");

        Ok(ActionOutcome::ShortcutSent)
    }

    async fn command(&self, action: &GestureAction) -> Result<ActionOutcome, ActionError> {
        let command = action
            .command
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ActionError::Configuration {
                reason: "Command action has no command string".to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let output = self.commands.execute(command).await;

        if output.exit_code != 0 {
            return Err(ActionError::CommandFailed {
                exit_code: output.exit_code,
                stdout: output.stdout,
                stderr: output.stderr,
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(ActionOutcome::CommandCompleted(output))
    }
}
