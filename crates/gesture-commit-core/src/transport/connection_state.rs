/// Connectivity of the detector link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No socket open; a reconnect may be scheduled.
    Disconnected,
    /// Socket opening or awaiting the probe reply.
    Connecting,
    /// Probe confirmed; frames are flowing.
    Connected,
}
