use crate::protocol::{AudioKind, DetectorCommand, DomainEvent, GestureKind};

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

/// Delay between a successful run and the start of the reset.
pub const DEFAULT_RESET_DELAY: Duration = Duration::from_secs(3);

/// Pause between releasing the camera and re-enabling the trigger.
pub const DEFAULT_RESET_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// What arms the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// A recognised sound.
    Audio(AudioKind),
    /// A recognised gesture.
    Gesture(GestureKind),
}

impl Default for Trigger {
    fn default() -> Self {
        Trigger::Audio(AudioKind::Snap)
    }
}

impl Trigger {
    /// Whether `event` is this trigger firing.
    pub fn matches(&self, event: &DomainEvent) -> bool {
        match (self, event) {
            (Trigger::Audio(expected), DomainEvent::AudioDetected(seen)) => expected == seen,
            (Trigger::Gesture(expected), DomainEvent::GestureDetected(seen)) => expected == seen,
            _ => false,
        }
    }

    /// Command that starts detecting this trigger.
    pub fn enable_command(&self) -> DetectorCommand {
        match self {
            Trigger::Audio(AudioKind::Snap) => DetectorCommand::EnableSnap,
            Trigger::Gesture(kind) => DetectorCommand::enable_for(*kind),
        }
    }

    /// Command that stops detecting this trigger.
    pub fn disable_command(&self) -> DetectorCommand {
        match self {
            Trigger::Audio(AudioKind::Snap) => DetectorCommand::DisableSnap,
            Trigger::Gesture(kind) => DetectorCommand::disable_for(*kind),
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Audio(kind) => write!(f, "audio:{}", kind),
            Trigger::Gesture(kind) => write!(f, "gesture:{}", kind),
        }
    }
}

/// Coordinator tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Event that arms the camera.
    pub trigger: Trigger,
    /// Gestures that fire their configured actions.
    pub targets: Vec<GestureKind>,
    /// Delay before resetting after a successful run.
    pub reset_delay: Duration,
    /// Settle time between releasing the camera and listening again.
    pub reset_settle_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            trigger: Trigger::default(),
            targets: vec![GestureKind::Heart],
            reset_delay: DEFAULT_RESET_DELAY,
            reset_settle_delay: DEFAULT_RESET_SETTLE_DELAY,
        }
    }
}
