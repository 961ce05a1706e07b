use std::panic::Location;

use error_location::ErrorLocation;
use thiserror::Error;

/// Boxed error returned by external collaborators.
///
/// The action runner treats any collaborator error uniformly as an action
/// failure, so the concrete type never matters past the trait boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Core errors with source location tracking.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Outbound frame could not be queued because no socket is open.
    #[error("Detector not connected {location}")]
    NotConnected {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Socket, handshake or probe failure.
    #[error("Transport error: {reason} {location}")]
    Transport {
        /// Description of the connection failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Settings could not be read or written.
    #[error("Settings error: {reason} {location}")]
    Settings {
        /// Description of the settings failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Failed to send message through async channel.
    #[error("Channel send failed: {message} {location}")]
    ChannelSendFailed {
        /// Human-readable error message.
        message: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

impl CoreError {
    /// Build a transport error at the caller's location.
    #[track_caller]
    pub fn transport(reason: impl Into<String>) -> Self {
        CoreError::Transport {
            reason: reason.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Build a settings error at the caller's location.
    #[track_caller]
    pub fn settings(reason: impl Into<String>) -> Self {
        CoreError::Settings {
            reason: reason.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

/// Result type alias using [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;
