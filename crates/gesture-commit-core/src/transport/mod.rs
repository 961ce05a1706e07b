mod backoff;
mod command_sink;
mod connection_state;
mod transport_event;
mod websocket;

pub use {
    backoff::{Backoff, MAX_RECONNECT_DELAY_SECS, reconnect_delay},
    command_sink::CommandSink,
    connection_state::ConnectionState,
    transport_event::TransportEvent,
    websocket::{DEFAULT_DETECTOR_URL, DEFAULT_PROBE_TIMEOUT, WebSocketTransport},
};
