//! Configuration management for gesture-commit.
//!
//! Handles loading and saving TOML configuration files with cross-platform
//! paths, startup validation of the detector endpoint, and atomic write
//! operations.

use crate::{
    AppError, AppResult,
    config::{DetectorConfig, GithubConfig, HotkeyConfig, SessionSection},
};

use std::{
    collections::BTreeMap,
    fs,
    io::Write,
    panic::Location,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use error_location::ErrorLocation;
use gesture_commit_core::{GestureAction, GestureKind};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Main configuration struct.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Detector connection.
    #[serde(default)]
    pub detector: DetectorConfig,
    /// Session coordinator tuning.
    #[serde(default)]
    pub session: SessionSection,
    /// Commit target.
    #[serde(default)]
    pub github: GithubConfig,
    /// Global hotkeys.
    #[serde(default)]
    pub hotkey: HotkeyConfig,
    /// Ordered actions per gesture, keyed by gesture wire token.
    #[serde(default)]
    pub gestures: BTreeMap<String, Vec<GestureAction>>,
    /// Whether first-run onboarding has been completed.
    #[serde(default)]
    pub onboarding_completed: bool,
}

impl Config {
    /// Load configuration from `path`, creating a default file if none exists.
    #[track_caller]
    #[instrument]
    pub fn load_from(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            info!(config_path = ?path, "No config found, creating default");
            let config = Config::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let contents = fs::read_to_string(path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to read config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let config: Config = toml::from_str(&contents).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to parse config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(config_path = ?path, "Configuration loaded");

        Ok(config)
    }

    /// Check that the detector URL is a WebSocket URL.
    ///
    /// Action settings are not validated here; their problems surface as
    /// per-action failures when a gesture fires.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn validate_detector_url(&self) -> AppResult<()> {
        let url = self.detector.url.trim();
        let rest = url
            .strip_prefix("ws://")
            .or_else(|| url.strip_prefix("wss://"));

        match rest {
            Some(host) if !host.is_empty() && !host.starts_with('/') => Ok(()),
            _ => Err(AppError::ConfigError {
                reason: format!(
                    "Detector URL '{}' must start with ws:// or wss:// and name a host",
                    self.detector.url
                ),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    /// Actions configured for `gesture`, in order.
    pub fn gesture_actions(&self, gesture: GestureKind) -> &[GestureAction] {
        self.gestures
            .get(gesture.as_wire())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Save configuration to `path` using atomic write pattern.
    ///
    /// Writes to a temporary file first, then renames to prevent corruption
    /// if the process crashes during the write.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        let contents = toml::to_string_pretty(self).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
                debug!(config_dir = ?parent, "Created config directory");
            }
        }

        let temp_path = path.with_extension("toml.tmp");

        let mut temp_file = fs::File::create(&temp_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to create temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        temp_file
            .write_all(contents.as_bytes())
            .map_err(|e| AppError::ConfigError {
                reason: format!("Failed to write temp config file: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        temp_file.sync_all().map_err(|e| AppError::ConfigError {
            reason: format!("Failed to sync temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        fs::rename(&temp_path, path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to rename temp config to final: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(config_path = ?path, "Configuration saved (atomic write)");

        Ok(())
    }

    /// Location of the config file in the platform config directory.
    #[track_caller]
    pub fn path() -> AppResult<PathBuf> {
        let proj_dirs =
            ProjectDirs::from("com", "gesture-commit", "Gesture-Commit").ok_or_else(|| {
                AppError::ConfigError {
                    reason: "Failed to get config directory".to_string(),
                    location: ErrorLocation::from(Location::caller()),
                }
            })?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }
}
