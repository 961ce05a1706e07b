use crate::BoxError;

use error_location::ErrorLocation;
use thiserror::Error;

/// Why a single action failed.
///
/// Recorded in the [`ActionResult`](crate::ActionResult) of the action; the
/// runner never propagates it.
#[derive(Error, Debug)]
pub enum ActionError {
    /// The action is missing required configuration.
    #[error("Action misconfigured: {reason} {location}")]
    Configuration {
        /// What is missing.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// An OS permission the action needs has not been granted.
    #[error("Permission missing: {reason} {location}")]
    PermissionDenied {
        /// Which permission.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The commit collaborator rejected the commit.
    #[error("Commit failed: {source} {location}")]
    Commit {
        /// Underlying collaborator error.
        #[source]
        source: BoxError,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The commit succeeded but stashing local changes afterwards failed.
    #[error("Stash after commit failed: {source} {location}")]
    Stash {
        /// Underlying collaborator error.
        #[source]
        source: BoxError,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Key injection failed.
    #[error("Shortcut failed: {source} {location}")]
    Shortcut {
        /// Underlying collaborator error.
        #[source]
        source: BoxError,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Shell command exited non-zero.
    #[error("Command exited with {exit_code}: {stderr} {location}")]
    CommandFailed {
        /// Process exit code.
        exit_code: i32,
        /// Captured standard output.
        stdout: String,
        /// Captured standard error.
        stderr: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

impl ActionError {
    /// Short category name, stable across messages.
    pub fn kind(&self) -> &'static str {
        match self {
            ActionError::Configuration { .. } => "configuration",
            ActionError::PermissionDenied { .. } => "permission",
            ActionError::Commit { .. } => "commit",
            ActionError::Stash { .. } => "stash",
            ActionError::Shortcut { .. } => "shortcut",
            ActionError::CommandFailed { .. } => "command",
        }
    }
}
