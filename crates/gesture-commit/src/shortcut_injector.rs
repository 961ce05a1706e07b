//! Keyboard shortcut injection through `enigo`.

use crate::{AppError, ModifierGuard};

use std::panic::Location;

use async_trait::async_trait;
use enigo::{Enigo, Key, Settings};
use error_location::ErrorLocation;
use gesture_commit_core::{BoxError, InputInjector, KeyChord, Modifier};
use tracing::{debug, instrument};

/// Sends key chords to the focused application.
#[derive(Debug, Default)]
pub struct EnigoInjector;

/// Map a chord modifier onto the enigo key.
pub(crate) fn modifier_key(modifier: Modifier) -> Key {
    match modifier {
        Modifier::Control => Key::Control,
        Modifier::Shift => Key::Shift,
        Modifier::Alt => Key::Alt,
        Modifier::Meta => Key::Meta,
    }
}

/// Map a chord key name onto the enigo key. Single characters are sent as
/// unicode; names are matched case-insensitively.
pub(crate) fn parse_key(name: &str) -> Option<Key> {
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Some(Key::Unicode(c.to_ascii_lowercase()));
    }

    let key = match name.to_ascii_lowercase().as_str() {
        "return" | "enter" => Key::Return,
        "tab" => Key::Tab,
        "space" => Key::Space,
        "escape" | "esc" => Key::Escape,
        "backspace" => Key::Backspace,
        "delete" => Key::Delete,
        "up" => Key::UpArrow,
        "down" => Key::DownArrow,
        "left" => Key::LeftArrow,
        "right" => Key::RightArrow,
        "home" => Key::Home,
        "end" => Key::End,
        "pageup" => Key::PageUp,
        "pagedown" => Key::PageDown,
        "f1" => Key::F1,
        "f2" => Key::F2,
        "f3" => Key::F3,
        "f4" => Key::F4,
        "f5" => Key::F5,
        "f6" => Key::F6,
        "f7" => Key::F7,
        "f8" => Key::F8,
        "f9" => Key::F9,
        "f10" => Key::F10,
        "f11" => Key::F11,
        "f12" => Key::F12,
        _ => return None,
    };

    Some(key)
}

#[track_caller]
fn send_blocking(chord: &KeyChord) -> Result<(), AppError> {
    let key = parse_key(&chord.key).ok_or_else(|| AppError::ShortcutFailed {
        reason: format!("Unknown key '{}'", chord.key),
        location: ErrorLocation::from(Location::caller()),
    })?;
    let modifiers: Vec<Key> = chord.modifiers.iter().copied().map(modifier_key).collect();

    let enigo = Enigo::new(&Settings::default()).map_err(|e| AppError::ShortcutFailed {
        reason: format!("Failed to create Enigo: {}", e),
        location: ErrorLocation::from(Location::caller()),
    })?;

    let mut guard = ModifierGuard::press(enigo, &modifiers)?;
    guard.click(key)
}

#[async_trait]
impl InputInjector for EnigoInjector {
    async fn has_permission(&self) -> bool {
        // Enigo only connects when the OS lets this process synthesize input.
        tokio::task::spawn_blocking(|| Enigo::new(&Settings::default()).is_ok())
            .await
            .unwrap_or(false)
    }

    #[instrument(skip_all, fields(chord = %chord))]
    async fn send_chord(&self, chord: &KeyChord) -> Result<(), BoxError> {
        let chord = chord.clone();

        tokio::task::spawn_blocking(move || send_blocking(&chord))
            .await
            .map_err(|e| -> BoxError { Box::new(e) })?
            .map_err(|e| -> BoxError { Box::new(e) })?;

        debug!("Chord injected");
        Ok(())
    }
}
