use crate::protocol::GestureKind;

use serde::Serialize;

/// Commands understood by the detector.
///
/// Target-gesture detection is toggled with the generalized
/// `EnableGesture`/`DisableGesture` pair. The per-gesture pairs are only
/// used when a gesture is configured as the trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetectorCommand {
    /// Start listening for finger snaps.
    EnableSnap,
    /// Stop listening for finger snaps.
    DisableSnap,
    /// Re-measure ambient noise for snap detection.
    CalibrateSnap,
    /// Start heart detection (legacy pair).
    EnableHeart,
    /// Stop heart detection (legacy pair).
    DisableHeart,
    /// Start thumbs-up detection.
    EnableThumbsUp,
    /// Stop thumbs-up detection.
    DisableThumbsUp,
    /// Start peace-sign detection.
    EnablePeace,
    /// Stop peace-sign detection.
    DisablePeace,
    /// Start detection of all target gestures.
    EnableGesture,
    /// Stop detection of all target gestures.
    DisableGesture,
}

#[derive(Serialize)]
struct OutboundFrame<'a> {
    command: &'a str,
}

impl DetectorCommand {
    /// Canonical wire token.
    pub fn as_wire(self) -> &'static str {
        match self {
            DetectorCommand::EnableSnap => "enable_snap",
            DetectorCommand::DisableSnap => "disable_snap",
            DetectorCommand::CalibrateSnap => "calibrate_snap",
            DetectorCommand::EnableHeart => "enable_heart",
            DetectorCommand::DisableHeart => "disable_heart",
            DetectorCommand::EnableThumbsUp => "enable_thumbs_up",
            DetectorCommand::DisableThumbsUp => "disable_thumbs_up",
            DetectorCommand::EnablePeace => "enable_peace",
            DetectorCommand::DisablePeace => "disable_peace",
            DetectorCommand::EnableGesture => "enable_gesture",
            DetectorCommand::DisableGesture => "disable_gesture",
        }
    }

    /// Per-gesture enable command.
    pub fn enable_for(kind: GestureKind) -> Self {
        match kind {
            GestureKind::Heart => DetectorCommand::EnableHeart,
            GestureKind::Peace => DetectorCommand::EnablePeace,
            GestureKind::ThumbsUp => DetectorCommand::EnableThumbsUp,
        }
    }

    /// Per-gesture disable command.
    pub fn disable_for(kind: GestureKind) -> Self {
        match kind {
            GestureKind::Heart => DetectorCommand::DisableHeart,
            GestureKind::Peace => DetectorCommand::DisablePeace,
            GestureKind::ThumbsUp => DetectorCommand::DisableThumbsUp,
        }
    }
}

/// Serialize a command into the detector's `{"command": "<token>"}` frame.
pub fn encode(command: DetectorCommand) -> String {
    let frame = OutboundFrame {
        command: command.as_wire(),
    };
    // A struct with one string field cannot fail to serialize.
    serde_json::to_string(&frame)
        .unwrap_or_else(|_| format!("{{\"command\":\"{}\"}}", command.as_wire()))
}
