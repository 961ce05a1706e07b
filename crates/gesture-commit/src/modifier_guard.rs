use crate::{AppError, AppResult};

use std::panic::Location;

use enigo::{Direction, Enigo, Key, Keyboard};
use error_location::ErrorLocation;
use tracing::warn;

/// RAII guard that holds a chord's modifier keys down.
///
/// Modifiers are pressed in order and released in reverse order when the
/// guard drops, including after a failed press or a failed key click, so a
/// modifier is never left stuck.
pub struct ModifierGuard {
    enigo: Enigo,
    pressed: Vec<Key>,
}

impl ModifierGuard {
    /// Press `modifiers` in order and return a guard that releases them on drop.
    #[track_caller]
    pub(crate) fn press(enigo: Enigo, modifiers: &[Key]) -> AppResult<Self> {
        let mut guard = Self {
            enigo,
            pressed: Vec::with_capacity(modifiers.len()),
        };

        for modifier in modifiers {
            guard
                .enigo
                .key(*modifier, Direction::Press)
                .map_err(|e| AppError::ShortcutFailed {
                    reason: format!("Failed to press {:?}: {}", modifier, e),
                    location: ErrorLocation::from(Location::caller()),
                })?;
            guard.pressed.push(*modifier);
        }

        Ok(guard)
    }

    /// Click `key` while the modifiers are held.
    #[track_caller]
    pub(crate) fn click(&mut self, key: Key) -> AppResult<()> {
        self.enigo
            .key(key, Direction::Click)
            .map_err(|e| AppError::ShortcutFailed {
                reason: format!("Failed to click {:?}: {}", key, e),
                location: ErrorLocation::from(Location::caller()),
            })
    }
}

impl Drop for ModifierGuard {
    fn drop(&mut self) {
        while let Some(modifier) = self.pressed.pop() {
            if let Err(e) = self.enigo.key(modifier, Direction::Release) {
                warn!(modifier = ?modifier, error = %e, "Failed to release modifier");
            }
        }
    }
}
