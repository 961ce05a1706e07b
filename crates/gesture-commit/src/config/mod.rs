mod detector_config;
#[allow(clippy::module_inception)]
mod config;
mod github_config;
mod hotkey_config;
mod session_section;

pub(crate) use {
    config::Config, detector_config::DetectorConfig, github_config::GithubConfig,
    hotkey_config::HotkeyConfig, session_section::SessionSection,
};

pub(crate) const DEFAULT_RESET_DELAY_MS: u64 = 3_000;
pub(crate) const DEFAULT_RESET_SETTLE_MS: u64 = 500;
pub(crate) const DEFAULT_DISMISS_HOTKEY: &str = "ctrl+shift+KeyD";

pub(crate) fn default_detector_url() -> String {
    gesture_commit_core::DEFAULT_DETECTOR_URL.to_string()
}

pub(crate) fn default_reset_delay_ms() -> u64 {
    DEFAULT_RESET_DELAY_MS
}

pub(crate) fn default_reset_settle_ms() -> u64 {
    DEFAULT_RESET_SETTLE_MS
}

pub(crate) fn default_base_branch() -> String {
    gesture_commit_core::DEFAULT_BASE_BRANCH.to_string()
}

pub(crate) fn default_dismiss_hotkey() -> String {
    DEFAULT_DISMISS_HOTKEY.to_string()
}
