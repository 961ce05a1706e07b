use crate::{
    AudioKind, ConnectionState, DomainEvent, SessionInput, TransportEvent,
    session::forward_events,
};

use std::time::Duration;

use tokio::{
    sync::{broadcast, mpsc},
    time::timeout,
};

const WAIT: Duration = Duration::from_secs(5);

/// WHAT: A frame received before a disconnect reaches the coordinator first
/// WHY: A snap from before the drop must not look like a snap after it
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_frame_then_disconnect_when_forwarding_then_socket_order_kept() {
    // Given: A snap frame followed by a disconnect on the transport stream
    let (events_tx, events_rx) = broadcast::channel(8);
    let (inputs_tx, mut inputs_rx) = mpsc::channel(8);
    events_tx
        .send(TransportEvent::Frame(r#"{"event":"audio","type":"snap"}"#.to_string()))
        .unwrap();
    events_tx
        .send(TransportEvent::State(ConnectionState::Disconnected))
        .unwrap();

    // When: Forwarding into the coordinator queue
    let forwarder = tokio::spawn(forward_events(events_rx, inputs_tx));

    // Then: The snap arrives before the disconnect
    let first = timeout(WAIT, inputs_rx.recv()).await.unwrap().unwrap();
    let second = timeout(WAIT, inputs_rx.recv()).await.unwrap().unwrap();
    assert_eq!(
        first,
        SessionInput::Detector(DomainEvent::AudioDetected(AudioKind::Snap))
    );
    assert_eq!(second, SessionInput::Detector(DomainEvent::Disconnected));

    drop(events_tx);
    timeout(WAIT, forwarder).await.unwrap().unwrap();
}

/// WHAT: Connecting and undecodable frames are not forwarded
/// WHY: The coordinator only reacts to Connected, Disconnected and decoded events
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_connecting_and_malformed_frame_when_forwarding_then_only_connected_delivered() {
    // Given: Connecting, a malformed frame, then Connected
    let (events_tx, events_rx) = broadcast::channel(8);
    let (inputs_tx, mut inputs_rx) = mpsc::channel(8);
    events_tx
        .send(TransportEvent::State(ConnectionState::Connecting))
        .unwrap();
    events_tx
        .send(TransportEvent::Frame("not json".to_string()))
        .unwrap();
    events_tx
        .send(TransportEvent::State(ConnectionState::Connected))
        .unwrap();
    drop(events_tx);

    // When: Forwarding until the stream closes
    forward_events(events_rx, inputs_tx).await;

    // Then: Only Connected was queued
    assert_eq!(
        inputs_rx.recv().await,
        Some(SessionInput::Detector(DomainEvent::Connected))
    );
    assert_eq!(inputs_rx.recv().await, None);
}
