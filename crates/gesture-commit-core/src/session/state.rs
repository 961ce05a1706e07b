use crate::actions::ActionError;

use std::fmt;

/// Normalized error carried by [`SessionState::ActionsFailed`].
///
/// Two descriptors are equal when kind and message match, whatever the
/// identity of the underlying error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDescriptor {
    /// Error category, e.g. `commit` or `stash`.
    pub kind: &'static str,
    /// Human-readable message.
    pub message: String,
}

impl ErrorDescriptor {
    /// Normalize an action failure.
    pub fn from_action_error(error: &ActionError) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

impl fmt::Display for ErrorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Gesture session state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the trigger; only the trigger detector is enabled.
    ListeningForTrigger,
    /// Trigger seen; waiting on camera permission.
    TriggerDetected,
    /// Permission granted; camera starting.
    ArmingCamera,
    /// Camera live; waiting for a target gesture.
    DetectingGesture,
    /// Target gesture seen; actions about to start.
    GestureDetectedPending,
    /// Action list executing.
    RunningActions,
    /// Actions done without a commit failure; reset scheduled.
    ActionsSucceeded,
    /// Commit failed; held until the user dismisses.
    ActionsFailed(ErrorDescriptor),
    /// Tearing down before listening again.
    Resetting,
}

impl SessionState {
    /// Whether the session is waiting for a trigger.
    pub fn is_idle(&self) -> bool {
        matches!(self, SessionState::ListeningForTrigger)
    }

    /// Whether the camera is (or is about to be) in use.
    pub fn is_camera_phase(&self) -> bool {
        matches!(
            self,
            SessionState::TriggerDetected
                | SessionState::ArmingCamera
                | SessionState::DetectingGesture
                | SessionState::GestureDetectedPending
        )
    }
}
