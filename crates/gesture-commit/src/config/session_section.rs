use crate::config::{default_reset_delay_ms, default_reset_settle_ms};

use std::time::Duration;

use gesture_commit_core::{GestureKind, SessionConfig, Trigger};
use serde::{Deserialize, Serialize};

fn default_targets() -> Vec<GestureKind> {
    vec![GestureKind::Heart]
}

/// Session coordinator tuning as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSection {
    /// Event that arms the camera.
    #[serde(default)]
    pub trigger: Trigger,
    /// Gestures that fire their configured actions.
    #[serde(default = "default_targets")]
    pub targets: Vec<GestureKind>,
    /// Delay before resetting after a successful run.
    #[serde(default = "default_reset_delay_ms")]
    pub reset_delay_ms: u64,
    /// Pause between releasing the camera and listening again.
    #[serde(default = "default_reset_settle_ms")]
    pub reset_settle_ms: u64,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            trigger: Trigger::default(),
            targets: default_targets(),
            reset_delay_ms: default_reset_delay_ms(),
            reset_settle_ms: default_reset_settle_ms(),
        }
    }
}

impl SessionSection {
    /// Coordinator configuration for this section.
    pub fn to_session_config(&self) -> SessionConfig {
        SessionConfig {
            trigger: self.trigger,
            targets: self.targets.clone(),
            reset_delay: Duration::from_millis(self.reset_delay_ms),
            reset_settle_delay: Duration::from_millis(self.reset_settle_ms),
        }
    }
}
