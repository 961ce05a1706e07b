use crate::{
    protocol::{DomainEvent, decode},
    session::SessionInput,
    transport::{ConnectionState, TransportEvent, WebSocketTransport},
};

use tokio::{
    sync::{broadcast, broadcast::error::RecvError, mpsc},
    task::JoinHandle,
};
use tracing::{debug, warn};

/// Feed transport connectivity and decoded frames into the coordinator.
///
/// Subscribes before returning, so no transition published after this call
/// is missed. Events reach the coordinator in socket order. The task ends
/// when the coordinator's input queue closes.
pub fn forward_transport_events(
    transport: &WebSocketTransport,
    inputs: mpsc::Sender<SessionInput>,
) -> JoinHandle<()> {
    tokio::spawn(forward_events(transport.subscribe_events(), inputs))
}

pub(crate) async fn forward_events(
    mut events: broadcast::Receiver<TransportEvent>,
    inputs: mpsc::Sender<SessionInput>,
) {
    loop {
        let event = match events.recv().await {
            Ok(TransportEvent::State(ConnectionState::Connected)) => Some(DomainEvent::Connected),
            Ok(TransportEvent::State(ConnectionState::Disconnected)) => {
                Some(DomainEvent::Disconnected)
            }
            Ok(TransportEvent::State(ConnectionState::Connecting)) => None,
            Ok(TransportEvent::Frame(raw)) => decode(&raw),
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Transport event stream lagged, events dropped");
                None
            }
            Err(RecvError::Closed) => break,
        };

        let Some(event) = event else {
            continue;
        };

        if inputs.send(SessionInput::Detector(event)).await.is_err() {
            debug!("Session input queue closed, stopping event forwarder");
            break;
        }
    }
}
