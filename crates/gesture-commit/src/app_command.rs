/// Commands sent to the main application from the hotkey handler and tray.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Dismiss the current session, same as closing its window.
    Dismiss,
    /// Ask the detector to recalibrate snap detection.
    CalibrateSnap,
    /// Open the URL of the last commit or pull request.
    OpenLastCommit,
    /// Request application shutdown.
    Shutdown,
}
