use crate::transport::ConnectionState;

/// One item on the combined transport stream.
///
/// Connectivity changes and inbound frames share a single stream so that
/// subscribers observe them in the order the socket produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Connectivity transition.
    State(ConnectionState),
    /// Inbound text frame, undecoded.
    Frame(String),
}
