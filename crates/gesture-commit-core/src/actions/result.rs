use crate::{
    actions::{ActionError, ActionType},
    protocol::GestureKind,
    session::ErrorDescriptor,
};

use std::path::PathBuf;

use uuid::Uuid;

/// Everything the commit collaborator needs for one commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRequest {
    /// Working tree to commit.
    pub project_folder: PathBuf,
    /// Branch the commit targets.
    pub base_branch: String,
    /// Push to a fresh branch and offer a pull request instead of pushing to the base branch.
    pub create_pull_request: bool,
    /// Commit message.
    pub message: String,
}

/// What the commit collaborator produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSuccess {
    /// Commit hash.
    pub sha: String,
    /// Branch the commit was pushed to.
    pub branch: String,
    /// Web URL of the commit or pull request, when known.
    pub url: Option<String>,
}

/// Output of one shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Exit code; spawn failures report -1.
    pub exit_code: i32,
}

/// Executor-specific payload of a successful action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Commit created and local changes stashed.
    Committed(CommitSuccess),
    /// Key chord delivered.
    ShortcutSent,
    /// Command exited zero.
    CommandCompleted(CommandOutput),
}

/// Result of one executed action.
#[derive(Debug)]
pub struct ActionResult {
    /// Id of the configured action.
    pub action_id: Uuid,
    /// Type of the configured action.
    pub action_type: ActionType,
    /// Success payload or failure.
    pub outcome: Result<ActionOutcome, ActionError>,
}

impl ActionResult {
    /// Whether the action succeeded.
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Ordered results of one action run. Counts are derived, not stored.
#[derive(Debug)]
pub struct ExecutionSummary {
    /// Gesture whose actions ran.
    pub gesture: GestureKind,
    /// One entry per configured action, in execution order.
    pub results: Vec<ActionResult>,
}

impl ExecutionSummary {
    /// Number of actions attempted.
    pub fn total_count(&self) -> usize {
        self.results.len()
    }

    /// Number of actions that succeeded.
    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    /// Number of actions that failed.
    pub fn failure_count(&self) -> usize {
        self.total_count() - self.success_count()
    }

    /// First failed commit action, which holds the session until dismissed.
    pub fn critical_failure(&self) -> Option<ErrorDescriptor> {
        self.results
            .iter()
            .filter(|r| r.action_type == ActionType::Commit)
            .find_map(|r| r.outcome.as_ref().err())
            .map(ErrorDescriptor::from_action_error)
    }

    /// URL of the first successful commit, if any.
    pub fn commit_url(&self) -> Option<&str> {
        self.results.iter().find_map(|r| match &r.outcome {
            Ok(ActionOutcome::Committed(commit)) => commit.url.as_deref(),
            _ => None,
        })
    }
}
