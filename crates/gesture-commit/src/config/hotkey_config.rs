use crate::config::default_dismiss_hotkey;

use serde::{Deserialize, Serialize};

/// Global hotkeys, in `global-hotkey` syntax (e.g. `ctrl+shift+KeyD`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotkeyConfig {
    /// Dismisses the current session, same as closing its window.
    #[serde(default = "default_dismiss_hotkey")]
    pub dismiss: String,
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            dismiss: default_dismiss_hotkey(),
        }
    }
}
