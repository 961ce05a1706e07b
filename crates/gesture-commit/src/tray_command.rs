use crate::TrayIconState;

/// Requests from the runtime thread to the tao event loop.
///
/// Session and detector changes arrive on the runtime thread, but only the
/// main thread may touch the tray icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayCommand {
    /// Show the icon for the current session phase or detector outage.
    SetState(TrayIconState),
    /// Leave the event loop after the session and detector link are closed.
    Shutdown,
}
