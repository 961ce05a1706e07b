use crate::protocol::DomainEvent;

/// Inputs accepted by the session coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionInput {
    /// Decoded detector event or connectivity change.
    Detector(DomainEvent),
    /// The user closed (dismissed) the presentation window.
    WindowClosed,
    /// Stop the coordinator loop.
    Shutdown,
}
