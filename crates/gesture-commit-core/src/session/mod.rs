mod bridge;
mod camera;
mod config;
mod coordinator;
mod input;
mod state;

#[cfg(test)]
pub(crate) use bridge::forward_events;

pub use {
    bridge::forward_transport_events,
    camera::CameraController,
    config::{DEFAULT_RESET_DELAY, DEFAULT_RESET_SETTLE_DELAY, SessionConfig, Trigger},
    coordinator::{SessionCoordinator, SessionDeps, SessionHandle},
    input::SessionInput,
    state::{ErrorDescriptor, SessionState},
};
