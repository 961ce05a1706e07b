//! Seams to the side-effecting executors.
//!
//! The core never touches git, the keyboard or processes directly; the
//! binary supplies implementations of these traits.

use crate::{
    BoxError,
    actions::{CommandOutput, CommitRequest, CommitSuccess, KeyChord},
};

use async_trait::async_trait;

/// Git / GitHub operations used by the commit action.
#[async_trait]
pub trait CommitClient: Send + Sync {
    /// Commit and publish the working tree described by `request`.
    async fn send_commit_data(&self, request: &CommitRequest) -> Result<CommitSuccess, BoxError>;

    /// Stash whatever is left in the working tree after a commit.
    async fn stash_changes(&self, request: &CommitRequest) -> Result<(), BoxError>;

    /// Local branch names of the project.
    async fn branches(&self, request: &CommitRequest) -> Result<Vec<String>, BoxError>;
}

/// Keyboard injection into the focused application.
#[async_trait]
pub trait InputInjector: Send + Sync {
    /// Whether the OS allows this process to synthesize input.
    async fn has_permission(&self) -> bool;

    /// Press and release `chord`.
    async fn send_chord(&self, chord: &KeyChord) -> Result<(), BoxError>;
}

/// Shell command execution. Never fails; errors surface as a non-zero exit.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run `command` to completion.
    async fn execute(&self, command: &str) -> CommandOutput;
}
