//! [`SettingsStore`] backed by the TOML config file.

use crate::config::Config;

use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use gesture_commit_core::{CoreError, CoreResult, SettingsKey, SettingsStore};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

/// Serves settings out of the shared [`Config`] and persists every save.
pub struct ConfigSettingsStore {
    config: Arc<Mutex<Config>>,
    path: PathBuf,
}

impl ConfigSettingsStore {
    /// Wrap `config`, persisting saves to `path`.
    pub fn new(config: Arc<Mutex<Config>>, path: PathBuf) -> Self {
        Self { config, path }
    }
}

fn to_value<T: Serialize + ?Sized>(key: &SettingsKey, value: &T) -> Option<Value> {
    serde_json::to_value(value)
        .inspect_err(|e| debug!(key = %key.as_key(), error = %e, "Setting not representable"))
        .ok()
}

#[track_caller]
fn from_value<T: DeserializeOwned>(key: &SettingsKey, value: Value) -> CoreResult<T> {
    serde_json::from_value(value)
        .map_err(|e| CoreError::settings(format!("Invalid value for {}: {}", key.as_key(), e)))
}

#[async_trait]
impl SettingsStore for ConfigSettingsStore {
    async fn get(&self, key: &SettingsKey) -> Option<Value> {
        let config = self.config.lock().await;

        match key {
            SettingsKey::GithubToken => to_value(key, &config.github.token),
            SettingsKey::ProjectFolder => to_value(key, &config.github.project_folder),
            SettingsKey::BaseBranch => to_value(key, &config.github.base_branch),
            SettingsKey::CreatePullRequest => to_value(key, &config.github.create_pull_request),
            SettingsKey::GestureActions(kind) => to_value(key, config.gesture_actions(*kind)),
            SettingsKey::Hotkeys => to_value(key, &config.hotkey),
            SettingsKey::OnboardingCompleted => to_value(key, &config.onboarding_completed),
        }
    }

    #[instrument(skip(self, value), fields(key = %key.as_key()))]
    async fn save(&self, key: &SettingsKey, value: Value) -> CoreResult<()> {
        let mut config = self.config.lock().await;
        let mut updated = config.clone();

        match key {
            SettingsKey::GithubToken => updated.github.token = from_value(key, value)?,
            SettingsKey::ProjectFolder => updated.github.project_folder = from_value(key, value)?,
            SettingsKey::BaseBranch => updated.github.base_branch = from_value(key, value)?,
            SettingsKey::CreatePullRequest => {
                updated.github.create_pull_request = from_value(key, value)?
            }
            SettingsKey::GestureActions(kind) => {
                updated
                    .gestures
                    .insert(kind.as_wire().to_string(), from_value(key, value)?);
            }
            SettingsKey::Hotkeys => updated.hotkey = from_value(key, value)?,
            SettingsKey::OnboardingCompleted => {
                updated.onboarding_completed = from_value(key, value)?
            }
        }

        updated
            .save_to(&self.path)
            .map_err(|e| CoreError::settings(e.to_string()))?;

        *config = updated;
        debug!("Setting saved");

        Ok(())
    }
}
