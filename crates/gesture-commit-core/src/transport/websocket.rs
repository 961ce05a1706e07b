//! Auto-reconnecting WebSocket link to the detector.
//!
//! One supervisor task owns the socket. It confirms every new connection
//! with a ping probe, publishes connectivity and inbound text frames, and
//! reconnects with exponential backoff until
//! [`WebSocketTransport::disconnect`] is called.
//!
//! Connectivity and frames are available as two independent streams and as
//! one combined [`TransportEvent`] stream that keeps socket order across
//! both.

use crate::{
    CoreError, CoreResult,
    protocol::{DetectorCommand, encode},
    transport::{Backoff, CommandSink, ConnectionState, TransportEvent},
};

use std::{panic::Location, sync::Arc, time::Duration};

use async_trait::async_trait;
use error_location::ErrorLocation;
use futures_util::{SinkExt, StreamExt};
use tokio::{
    net::TcpStream,
    sync::{Mutex, broadcast, mpsc, watch},
    task::JoinHandle,
};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tracing::{debug, info, instrument, warn};

type DetectorSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Address the detector listens on unless configured otherwise.
pub const DEFAULT_DETECTOR_URL: &str = "ws://localhost:8765";

/// How long the detector has to answer the liveness probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

const PROBE_PAYLOAD: &[u8] = b"gesture-commit-probe";
const STREAM_CAPACITY: usize = 256;
const STOP_TIMEOUT: Duration = Duration::from_secs(1);

/// Handle to the detector link. Cheap to clone; all clones share one socket.
#[derive(Clone)]
pub struct WebSocketTransport {
    inner: Arc<Inner>,
}

struct Inner {
    url: String,
    probe_timeout: Duration,
    state_tx: broadcast::Sender<ConnectionState>,
    message_tx: broadcast::Sender<String>,
    event_tx: broadcast::Sender<TransportEvent>,
    link: Mutex<Link>,
}

struct Link {
    state: ConnectionState,
    outbound: Option<mpsc::UnboundedSender<Message>>,
    stop_tx: Option<watch::Sender<bool>>,
    supervisor: Option<JoinHandle<()>>,
}

enum PumpExit {
    Stopped,
    Failed(CoreError),
}

impl WebSocketTransport {
    /// Create a transport for `url` with the default probe timeout.
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_probe_timeout(url, DEFAULT_PROBE_TIMEOUT)
    }

    /// Create a transport with an explicit probe timeout.
    pub fn with_probe_timeout(url: impl Into<String>, probe_timeout: Duration) -> Self {
        let (state_tx, _) = broadcast::channel(STREAM_CAPACITY);
        let (message_tx, _) = broadcast::channel(STREAM_CAPACITY);
        let (event_tx, _) = broadcast::channel(STREAM_CAPACITY);

        Self {
            inner: Arc::new(Inner {
                url: url.into(),
                probe_timeout,
                state_tx,
                message_tx,
                event_tx,
                link: Mutex::new(Link {
                    state: ConnectionState::Disconnected,
                    outbound: None,
                    stop_tx: None,
                    supervisor: None,
                }),
            }),
        }
    }

    /// Configured endpoint.
    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// Current connectivity.
    pub async fn state(&self) -> ConnectionState {
        self.inner.link.lock().await.state
    }

    /// Subscribe to connectivity transitions.
    pub fn subscribe_state(&self) -> broadcast::Receiver<ConnectionState> {
        self.inner.state_tx.subscribe()
    }

    /// Subscribe to inbound text frames, in socket order.
    pub fn subscribe_messages(&self) -> broadcast::Receiver<String> {
        self.inner.message_tx.subscribe()
    }

    /// Subscribe to connectivity transitions and inbound frames as one
    /// stream, in the order the socket produced them.
    pub fn subscribe_events(&self) -> broadcast::Receiver<TransportEvent> {
        self.inner.event_tx.subscribe()
    }

    /// Start the link. No-op while a link is connected, connecting or
    /// waiting out a reconnect delay.
    #[instrument(skip(self), fields(url = %self.inner.url))]
    pub async fn connect(&self) {
        let mut link = self.inner.link.lock().await;

        if link
            .supervisor
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
        {
            debug!("Connect ignored, detector link already active");
            return;
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        link.stop_tx = Some(stop_tx);
        link.supervisor = Some(tokio::spawn(Inner::supervise(
            Arc::clone(&self.inner),
            stop_rx,
        )));

        info!("Detector link started");
    }

    /// Close the link deliberately. No reconnect is scheduled afterwards.
    #[instrument(skip(self), fields(url = %self.inner.url))]
    pub async fn disconnect(&self) {
        let (stop_tx, supervisor) = {
            let mut link = self.inner.link.lock().await;
            link.outbound = None;
            (link.stop_tx.take(), link.supervisor.take())
        };

        if let Some(stop_tx) = stop_tx {
            let _ = stop_tx.send(true);
        }

        if let Some(handle) = supervisor {
            let abort = handle.abort_handle();
            match tokio::time::timeout(STOP_TIMEOUT, handle).await {
                Ok(Ok(())) => debug!("Detector supervisor stopped cleanly"),
                Ok(Err(e)) => warn!(error = ?e, "Detector supervisor task panicked"),
                Err(_) => {
                    abort.abort();
                    warn!("Detector supervisor did not stop within timeout, aborted");
                }
            }
        }

        self.inner.set_state(ConnectionState::Disconnected).await;
        info!("Detector link closed");
    }

    /// Queue one outbound text frame.
    ///
    /// Fails with [`CoreError::NotConnected`] unless the link is connected.
    /// A write failure on the socket itself tears the connection down and
    /// triggers a reconnect.
    #[track_caller]
    pub fn send(&self, message: String) -> impl Future<Output = CoreResult<()>> + Send + '_ {
        let location = ErrorLocation::from(Location::caller());

        async move {
            let link = self.inner.link.lock().await;

            let queued = match (&link.state, &link.outbound) {
                (ConnectionState::Connected, Some(outbound)) => {
                    outbound.send(Message::Text(message.into())).is_ok()
                }
                _ => false,
            };

            if queued {
                Ok(())
            } else {
                Err(CoreError::NotConnected { location })
            }
        }
    }
}

#[async_trait]
impl CommandSink for WebSocketTransport {
    async fn send_command(&self, command: DetectorCommand) -> CoreResult<()> {
        debug!(command = command.as_wire(), "Sending detector command");
        self.send(encode(command)).await
    }
}

impl Inner {
    async fn set_state(&self, state: ConnectionState) {
        let mut link = self.link.lock().await;
        if link.state == state {
            return;
        }
        link.state = state;
        // Published under the lock so subscribers see transitions in order.
        let _ = self.state_tx.send(state);
        let _ = self.event_tx.send(TransportEvent::State(state));
    }

    fn publish_frame(&self, text: String) {
        let _ = self.message_tx.send(text.clone());
        let _ = self.event_tx.send(TransportEvent::Frame(text));
    }

    async fn supervise(self: Arc<Self>, mut stop_rx: watch::Receiver<bool>) {
        let mut backoff = Backoff::default();

        loop {
            if *stop_rx.borrow() {
                break;
            }

            self.set_state(ConnectionState::Connecting).await;

            let established = tokio::select! {
                _ = stop_rx.changed() => break,
                result = self.establish() => result,
            };

            match established {
                Ok((socket, buffered)) => {
                    backoff.reset();

                    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
                    self.link.lock().await.outbound = Some(outbound_tx);
                    self.set_state(ConnectionState::Connected).await;
                    info!(url = %self.url, "Detector connected");

                    for text in buffered {
                        self.publish_frame(text);
                    }

                    let exit = self.pump(socket, outbound_rx, &mut stop_rx).await;
                    self.link.lock().await.outbound = None;

                    match exit {
                        PumpExit::Stopped => break,
                        PumpExit::Failed(e) => warn!(error = %e, "Detector connection lost"),
                    }
                }
                Err(e) => {
                    warn!(attempt = backoff.attempt(), error = %e, "Detector connection failed");
                }
            }

            self.set_state(ConnectionState::Disconnected).await;

            let delay = backoff.next_delay();
            info!(
                delay_secs = delay.as_secs(),
                attempt = backoff.attempt(),
                "Detector reconnect scheduled"
            );

            tokio::select! {
                _ = stop_rx.changed() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        self.set_state(ConnectionState::Disconnected).await;
        debug!("Detector supervisor exiting");
    }

    async fn establish(&self) -> CoreResult<(DetectorSocket, Vec<String>)> {
        let (mut socket, _response) = connect_async(self.url.as_str())
            .await
            .map_err(|e| CoreError::transport(format!("Handshake with {} failed: {}", self.url, e)))?;

        socket
            .send(Message::Ping(PROBE_PAYLOAD.to_vec().into()))
            .await
            .map_err(|e| CoreError::transport(format!("Failed to send probe: {}", e)))?;

        let mut buffered = Vec::new();
        let reply = tokio::time::timeout(
            self.probe_timeout,
            Self::await_probe_reply(&mut socket, &mut buffered),
        )
        .await;

        match reply {
            Ok(Ok(())) => {
                debug!(buffered = buffered.len(), "Probe confirmed");
                Ok((socket, buffered))
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(CoreError::transport(format!(
                "No probe reply within {:?}",
                self.probe_timeout
            ))),
        }
    }

    // Text frames arriving ahead of the pong are kept for publication once
    // the connected state has been announced.
    async fn await_probe_reply(
        socket: &mut DetectorSocket,
        buffered: &mut Vec<String>,
    ) -> CoreResult<()> {
        while let Some(frame) = socket.next().await {
            match frame {
                Ok(Message::Pong(_)) => return Ok(()),
                Ok(Message::Text(text)) => buffered.push(text.as_str().to_owned()),
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => return Err(CoreError::transport(format!("Probe failed: {}", e))),
            }
        }

        Err(CoreError::transport("Detector closed the socket during probe"))
    }

    async fn pump(
        &self,
        socket: DetectorSocket,
        mut outbound_rx: mpsc::UnboundedReceiver<Message>,
        stop_rx: &mut watch::Receiver<bool>,
    ) -> PumpExit {
        let (mut sink, mut stream) = socket.split();

        loop {
            tokio::select! {
                _ = stop_rx.changed() => {
                    let _ = sink.send(Message::Close(None)).await;
                    return PumpExit::Stopped;
                }

                Some(message) = outbound_rx.recv() => {
                    if let Err(e) = sink.send(message).await {
                        return PumpExit::Failed(CoreError::transport(format!("Send failed: {}", e)));
                    }
                }

                frame = stream.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        self.publish_frame(text.as_str().to_owned());
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        return PumpExit::Failed(CoreError::transport("Detector closed the socket"));
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        return PumpExit::Failed(CoreError::transport(format!("Receive failed: {}", e)));
                    }
                },
            }
        }
    }
}
