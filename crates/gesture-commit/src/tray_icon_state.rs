use gesture_commit_core::SessionState;

/// Tray icon states following the gesture session and detector link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayIconState {
    /// Detector not connected.
    Offline,
    /// Waiting for the trigger.
    Listening,
    /// Camera armed, waiting for a gesture.
    Detecting,
    /// Actions executing.
    Running,
    /// Last run succeeded.
    Succeeded,
    /// Commit failed; waiting for dismissal.
    Failed,
}

impl TrayIconState {
    /// Icon state for a session state and detector connectivity.
    ///
    /// A running or finished session keeps its icon while offline so the
    /// outcome stays visible.
    pub fn from_session(state: &SessionState, connected: bool) -> Self {
        match state {
            SessionState::RunningActions | SessionState::GestureDetectedPending => Self::Running,
            SessionState::ActionsSucceeded => Self::Succeeded,
            SessionState::ActionsFailed(_) => Self::Failed,
            _ if !connected => Self::Offline,
            SessionState::TriggerDetected
            | SessionState::ArmingCamera
            | SessionState::DetectingGesture => Self::Detecting,
            SessionState::ListeningForTrigger | SessionState::Resetting => Self::Listening,
        }
    }

    /// Tooltip text.
    pub fn tooltip(self) -> &'static str {
        match self {
            Self::Offline => "Gesture Commit - Detector offline",
            Self::Listening => "Gesture Commit - Listening",
            Self::Detecting => "Gesture Commit - Show a gesture",
            Self::Running => "Gesture Commit - Running actions...",
            Self::Succeeded => "Gesture Commit - Done",
            Self::Failed => "Gesture Commit - Commit failed, dismiss to retry",
        }
    }

    /// Icon fill colour as RGBA.
    pub fn color(self) -> [u8; 4] {
        match self {
            Self::Offline => [128, 128, 128, 255],
            Self::Listening => [66, 133, 244, 255],
            Self::Detecting => [251, 188, 5, 255],
            Self::Running => [171, 71, 188, 255],
            Self::Succeeded => [52, 168, 83, 255],
            Self::Failed => [234, 67, 53, 255],
        }
    }
}
