//! Persisted-settings capability.
//!
//! The core reads and writes settings through [`SettingsStore`] and never
//! learns how they are stored.

use crate::{
    CoreResult,
    actions::{GestureAction, MAX_ACTIONS_PER_GESTURE},
    protocol::GestureKind,
};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

/// Branch commits target when none is configured.
pub const DEFAULT_BASE_BRANCH: &str = "main";

/// Keys of every persisted setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingsKey {
    /// GitHub personal access token.
    GithubToken,
    /// Working tree the commit action commits.
    ProjectFolder,
    /// Branch commits target.
    BaseBranch,
    /// Whether commits go to a pull-request branch.
    CreatePullRequest,
    /// Ordered actions attached to a gesture.
    GestureActions(GestureKind),
    /// Global hotkey configuration.
    Hotkeys,
    /// Whether first-run onboarding has been completed.
    OnboardingCompleted,
}

impl SettingsKey {
    /// Storage key string.
    pub fn as_key(&self) -> String {
        match self {
            SettingsKey::GithubToken => "github_token".to_string(),
            SettingsKey::ProjectFolder => "project_folder".to_string(),
            SettingsKey::BaseBranch => "base_branch".to_string(),
            SettingsKey::CreatePullRequest => "create_pull_request".to_string(),
            SettingsKey::GestureActions(kind) => format!("gesture_actions.{}", kind),
            SettingsKey::Hotkeys => "hotkeys".to_string(),
            SettingsKey::OnboardingCompleted => "onboarding_completed".to_string(),
        }
    }
}

/// Key-value settings storage.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Current value of `key`, if set.
    async fn get(&self, key: &SettingsKey) -> Option<Value>;

    /// Persist `value` under `key`.
    async fn save(&self, key: &SettingsKey, value: Value) -> CoreResult<()>;
}

/// Read `key` and deserialize it, logging values of the wrong shape.
pub async fn get_typed<T: DeserializeOwned>(
    store: &dyn SettingsStore,
    key: &SettingsKey,
) -> Option<T> {
    let value = store.get(key).await?;
    if value.is_null() {
        return None;
    }

    match serde_json::from_value(value) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!(key = %key.as_key(), error = %e, "Ignoring setting with unexpected type");
            None
        }
    }
}

/// Actions configured for `gesture`, capped at [`MAX_ACTIONS_PER_GESTURE`].
pub async fn load_gesture_actions(
    store: &dyn SettingsStore,
    gesture: GestureKind,
) -> Vec<GestureAction> {
    let mut actions: Vec<GestureAction> =
        get_typed(store, &SettingsKey::GestureActions(gesture))
            .await
            .unwrap_or_default();

    if actions.len() > MAX_ACTIONS_PER_GESTURE {
        warn!(
            gesture = %gesture,
            configured = actions.len(),
            max = MAX_ACTIONS_PER_GESTURE,
            "Too many actions configured, extra actions dropped"
        );
        actions.truncate(MAX_ACTIONS_PER_GESTURE);
    }

    actions
}
