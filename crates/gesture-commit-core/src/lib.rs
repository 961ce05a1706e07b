//! Gesture-Commit Core Library
//!
//! Connects to an external gesture detector over WebSocket, runs the
//! gesture session state machine, and executes the actions configured for
//! the detected gesture.
//!
//! # Example
//!
//! ```no_run
//! use gesture_commit_core::{
//!     SessionConfig, SessionCoordinator, SessionDeps, WebSocketTransport,
//!     forward_transport_events,
//! };
//!
//! async fn start(deps: SessionDeps) {
//!     let transport = WebSocketTransport::new("ws://localhost:8765");
//!     let (coordinator, handle) = SessionCoordinator::new(SessionConfig::default(), deps);
//!
//!     forward_transport_events(&transport, handle.inputs());
//!     transport.connect().await;
//!     coordinator.run().await;
//! }
//! ```

mod actions;
mod error;
mod protocol;
mod session;
mod settings;
mod transport;

pub use {
    actions::{
        ActionError, ActionOutcome, ActionResult, ActionRunner, ActionType, CommandExecutor,
        CommandOutput, CommitClient, CommitRequest, CommitSuccess, ExecutionSummary,
        GestureAction, InputInjector, KeyChord, MAX_ACTIONS_PER_GESTURE, Modifier,
    },
    error::{BoxError, CoreError, Result as CoreResult},
    protocol::{AudioKind, DetectorCommand, DomainEvent, GestureKind, decode, encode},
    session::{
        CameraController, DEFAULT_RESET_DELAY, DEFAULT_RESET_SETTLE_DELAY, ErrorDescriptor,
        SessionConfig, SessionCoordinator, SessionDeps, SessionHandle, SessionInput, SessionState,
        Trigger, forward_transport_events,
    },
    settings::{
        DEFAULT_BASE_BRANCH, SettingsKey, SettingsStore, get_typed, load_gesture_actions,
    },
    transport::{
        Backoff, CommandSink, ConnectionState, DEFAULT_DETECTOR_URL, DEFAULT_PROBE_TIMEOUT,
        MAX_RECONNECT_DELAY_SECS, TransportEvent, WebSocketTransport, reconnect_delay,
    },
};
