use crate::config::default_detector_url;

use serde::{Deserialize, Serialize};

/// Gesture detector connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// WebSocket endpoint of the detector (`ws://` or `wss://`).
    #[serde(default = "default_detector_url")]
    pub url: String,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            url: default_detector_url(),
        }
    }
}
