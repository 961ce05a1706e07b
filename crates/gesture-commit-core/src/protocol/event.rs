use std::fmt;

use serde::{Deserialize, Serialize};

/// Hand gestures the detector can recognise.
///
/// The session coordinator only compares kinds against its configured
/// trigger and target set, so adding a variant here needs no change to
/// the transition logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureKind {
    /// Two hands forming a heart.
    Heart,
    /// Index and middle finger raised.
    Peace,
    /// Closed fist with the thumb up.
    ThumbsUp,
}

impl GestureKind {
    /// Every known gesture, in wire order.
    pub const ALL: [GestureKind; 3] = [GestureKind::Heart, GestureKind::Peace, GestureKind::ThumbsUp];

    /// Wire token used by the detector for this gesture.
    pub fn as_wire(self) -> &'static str {
        match self {
            GestureKind::Heart => "heart",
            GestureKind::Peace => "peace",
            GestureKind::ThumbsUp => "thumbs_up",
        }
    }

    /// Parse a detector wire token.
    pub fn from_wire(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_wire() == token)
    }
}

impl fmt::Display for GestureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// Sounds the detector can recognise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioKind {
    /// A finger snap.
    Snap,
}

impl AudioKind {
    /// Wire token used by the detector for this sound.
    pub fn as_wire(self) -> &'static str {
        match self {
            AudioKind::Snap => "snap",
        }
    }

    /// Parse a detector wire token.
    pub fn from_wire(token: &str) -> Option<Self> {
        match token {
            "snap" => Some(AudioKind::Snap),
            _ => None,
        }
    }
}

impl fmt::Display for AudioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// Typed event consumed by the session coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainEvent {
    /// Detector link confirmed by the liveness probe.
    Connected,
    /// Detector link lost or closed.
    Disconnected,
    /// A gesture entered the frame.
    GestureDetected(GestureKind),
    /// A previously detected gesture left the frame.
    GestureLost(GestureKind),
    /// A sound was recognised.
    AudioDetected(AudioKind),
    /// Number of hands currently visible.
    HandCount(u32),
}
