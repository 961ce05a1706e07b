//! In-memory collaborators shared by the unit tests.

use crate::{
    BoxError, CameraController, CommandExecutor, CommandOutput, CommandSink, CommitClient,
    CommitRequest, CommitSuccess, CoreResult, DetectorCommand, InputInjector, KeyChord,
    SettingsKey, SettingsStore,
};

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Notify;

fn locked<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Records every command the coordinator sends.
#[derive(Default)]
pub(crate) struct RecordingSink {
    sent: Mutex<Vec<DetectorCommand>>,
}

impl RecordingSink {
    pub(crate) fn sent(&self) -> Vec<DetectorCommand> {
        locked(&self.sent).clone()
    }

    pub(crate) fn count(&self, command: DetectorCommand) -> usize {
        locked(&self.sent).iter().filter(|c| **c == command).count()
    }
}

#[async_trait]
impl CommandSink for RecordingSink {
    async fn send_command(&self, command: DetectorCommand) -> CoreResult<()> {
        locked(&self.sent).push(command);
        Ok(())
    }
}

/// Camera that answers permission requests with a fixed value, or never.
pub(crate) struct FakeCamera {
    granted: bool,
    unanswered: bool,
    pub(crate) permission_requests: AtomicUsize,
    pub(crate) starts: AtomicUsize,
    pub(crate) stops: AtomicUsize,
}

impl FakeCamera {
    pub(crate) fn new(granted: bool) -> Self {
        Self {
            granted,
            unanswered: false,
            permission_requests: AtomicUsize::new(0),
            starts: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
        }
    }

    /// A camera whose permission prompt is never answered.
    pub(crate) fn unanswered() -> Self {
        Self {
            unanswered: true,
            ..Self::new(false)
        }
    }
}

#[async_trait]
impl CameraController for FakeCamera {
    async fn request_permission(&self) -> bool {
        self.permission_requests.fetch_add(1, Ordering::SeqCst);
        if self.unanswered {
            std::future::pending::<()>().await;
        }
        self.granted
    }

    async fn start_camera(&self) {
        self.starts.fetch_add(1, Ordering::SeqCst);
    }

    async fn stop_camera(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

/// Settings kept in a map keyed by [`SettingsKey::as_key`].
#[derive(Default)]
pub(crate) struct MemorySettings {
    values: Mutex<HashMap<String, Value>>,
}

impl MemorySettings {
    pub(crate) fn with(self, key: SettingsKey, value: Value) -> Self {
        locked(&self.values).insert(key.as_key(), value);
        self
    }
}

#[async_trait]
impl SettingsStore for MemorySettings {
    async fn get(&self, key: &SettingsKey) -> Option<Value> {
        locked(&self.values).get(&key.as_key()).cloned()
    }

    async fn save(&self, key: &SettingsKey, value: Value) -> CoreResult<()> {
        locked(&self.values).insert(key.as_key(), value);
        Ok(())
    }
}

/// Commit client with switchable failures.
pub(crate) struct FakeCommitClient {
    pub(crate) fail_commit: bool,
    pub(crate) fail_stash: bool,
    pub(crate) branches: Vec<String>,
    pub(crate) commits: AtomicUsize,
    pub(crate) stashes: AtomicUsize,
}

impl Default for FakeCommitClient {
    fn default() -> Self {
        Self {
            fail_commit: false,
            fail_stash: false,
            branches: vec!["main".to_string()],
            commits: AtomicUsize::new(0),
            stashes: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CommitClient for FakeCommitClient {
    async fn send_commit_data(&self, request: &CommitRequest) -> Result<CommitSuccess, BoxError> {
        self.commits.fetch_add(1, Ordering::SeqCst);
        if self.fail_commit {
            return Err("network unreachable".into());
        }
        Ok(CommitSuccess {
            sha: "abc123".to_string(),
            branch: request.base_branch.clone(),
            url: Some("https://github.com/octo/repo/commit/abc123".to_string()),
        })
    }

    async fn stash_changes(&self, _request: &CommitRequest) -> Result<(), BoxError> {
        self.stashes.fetch_add(1, Ordering::SeqCst);
        if self.fail_stash {
            return Err("stash refused".into());
        }
        Ok(())
    }

    async fn branches(&self, _request: &CommitRequest) -> Result<Vec<String>, BoxError> {
        Ok(self.branches.clone())
    }
}

/// Keyboard injector that records chords.
pub(crate) struct FakeInjector {
    permission: bool,
    sent: Mutex<Vec<KeyChord>>,
}

impl FakeInjector {
    pub(crate) fn new(permission: bool) -> Self {
        Self {
            permission,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn sent(&self) -> Vec<KeyChord> {
        locked(&self.sent).clone()
    }
}

#[async_trait]
impl InputInjector for FakeInjector {
    async fn has_permission(&self) -> bool {
        self.permission
    }

    async fn send_chord(&self, chord: &KeyChord) -> Result<(), BoxError> {
        locked(&self.sent).push(chord.clone());
        Ok(())
    }
}

/// Executor that fails any command containing `fail`.
///
/// A gated executor records the call, then waits for one permit on the gate.
#[derive(Default)]
pub(crate) struct FakeExecutor {
    calls: Mutex<Vec<String>>,
    gate: Option<Arc<Notify>>,
}

impl FakeExecutor {
    pub(crate) fn gated(gate: Arc<Notify>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            gate: Some(gate),
        }
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        locked(&self.calls).clone()
    }
}

#[async_trait]
impl CommandExecutor for FakeExecutor {
    async fn execute(&self, command: &str) -> CommandOutput {
        locked(&self.calls).push(command.to_string());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if command.contains("fail") {
            CommandOutput {
                stdout: String::new(),
                stderr: format!("{}: exit 2", command),
                exit_code: 2,
            }
        } else {
            CommandOutput {
                stdout: format!("ran {}", command),
                stderr: String::new(),
                exit_code: 0,
            }
        }
    }
}
