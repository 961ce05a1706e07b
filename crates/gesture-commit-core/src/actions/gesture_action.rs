use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Upper bound on configured actions per gesture.
pub const MAX_ACTIONS_PER_GESTURE: usize = 10;

/// What a configured action does when its gesture fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Commit the working tree of the configured project.
    Commit,
    /// Send a key chord to the focused application.
    Shortcut,
    /// Run a shell command.
    Command,
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ActionType::Commit => "commit",
            ActionType::Shortcut => "shortcut",
            ActionType::Command => "command",
        })
    }
}

/// Modifier keys a chord can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    /// Control.
    Control,
    /// Shift.
    Shift,
    /// Alt / Option.
    Alt,
    /// Command on macOS, the Windows/Super key elsewhere.
    Meta,
}

/// A key chord such as `meta+shift+s`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyChord {
    /// Modifiers held while the key is clicked, pressed in order.
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    /// Key name: a single character or a named key (`return`, `tab`, `f5`, ...).
    pub key: String,
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for modifier in &self.modifiers {
            let name = match modifier {
                Modifier::Control => "ctrl",
                Modifier::Shift => "shift",
                Modifier::Alt => "alt",
                Modifier::Meta => "meta",
            };
            write!(f, "{}+", name)?;
        }
        f.write_str(&self.key)
    }
}

/// One user-configured action attached to a gesture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GestureAction {
    /// Stable identifier.
    pub id: Uuid,
    /// Which executor handles this action.
    pub action_type: ActionType,
    /// Key chord, required for [`ActionType::Shortcut`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotkey: Option<KeyChord>,
    /// Shell command, required for [`ActionType::Command`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

impl GestureAction {
    /// A commit action.
    pub fn commit() -> Self {
        Self {
            id: Uuid::new_v4(),
            action_type: ActionType::Commit,
            hotkey: None,
            command: None,
        }
    }

    /// A shortcut action sending `chord`.
    pub fn shortcut(chord: KeyChord) -> Self {
        Self {
            id: Uuid::new_v4(),
            action_type: ActionType::Shortcut,
            hotkey: Some(chord),
            command: None,
        }
    }

    /// A shell command action.
    pub fn command(command: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            action_type: ActionType::Command,
            hotkey: None,
            command: Some(command.into()),
        }
    }
}
