//! Global dismiss hotkey.
//!
//! Registers the configured hotkey and turns each press into
//! [`AppCommand::Dismiss`], the same signal as closing the session window.

use crate::{AppCommand, AppError, AppResult};

use std::{panic::Location, str::FromStr, time::Duration};

use error_location::ErrorLocation;
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState, hotkey::HotKey};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, instrument, warn};

/// Parse a hotkey in `global-hotkey` syntax, e.g. `ctrl+shift+KeyD`.
#[track_caller]
pub fn parse_hotkey(spec: &str) -> AppResult<HotKey> {
    HotKey::from_str(spec).map_err(|e| AppError::HotkeyRegistrationFailed {
        reason: format!("Invalid hotkey '{}': {}", spec, e),
        location: ErrorLocation::from(Location::caller()),
    })
}

/// Forwards presses of the dismiss hotkey to the application.
pub struct HotkeyHandler {
    hotkey_id: u32,
    command_tx: mpsc::Sender<AppCommand>,
}

impl HotkeyHandler {
    /// Register `spec` as the global dismiss hotkey.
    ///
    /// Must be called on a thread with a message pump (e.g. the main thread
    /// running a `tao` event loop) so that `WM_HOTKEY` messages are
    /// dispatched on Windows. The returned [`GlobalHotKeyManager`] must be
    /// kept alive on that thread for the hotkey to remain registered.
    #[track_caller]
    #[instrument]
    pub fn register_hotkey(spec: &str) -> AppResult<(GlobalHotKeyManager, u32)> {
        let hotkey = parse_hotkey(spec)?;

        let manager =
            GlobalHotKeyManager::new().map_err(|e| AppError::HotkeyRegistrationFailed {
                reason: format!("Failed to create manager: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        manager
            .register(hotkey)
            .map_err(|e| AppError::HotkeyRegistrationFailed {
                reason: format!("Failed to register {}: {}", spec, e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        info!(hotkey = spec, "Dismiss hotkey registered");

        Ok((manager, hotkey.id()))
    }

    /// Create a handler for a previously registered hotkey.
    pub fn new(hotkey_id: u32, command_tx: mpsc::Sender<AppCommand>) -> Self {
        Self {
            hotkey_id,
            command_tx,
        }
    }

    /// Forward hotkey presses until a shutdown signal is received.
    #[instrument(skip(self))]
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) -> AppResult<()> {
        let receiver = GlobalHotKeyEvent::receiver().clone();
        let (event_tx, mut event_rx) = mpsc::channel(32);

        // The crossbeam receiver blocks; when event_rx is dropped the next
        // blocking_send fails and the task ends.
        let handle = tokio::task::spawn_blocking(move || {
            while let Ok(event) = receiver.recv() {
                if event_tx.blocking_send(event).is_err() {
                    break;
                }
            }
        });

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    info!("Hotkey handler shutting down");
                    break;
                }
                Some(event) = event_rx.recv() => {
                    if let Err(e) = self.on_event(event.id, event.state).await {
                        warn!(error = %e, "Dismiss hotkey not delivered");
                    }
                }
            }
        }

        drop(event_rx);

        // The blocking task may sit in recv() until the next hotkey event.
        match tokio::time::timeout(Duration::from_secs(1), handle).await {
            Ok(Ok(())) => debug!("Hotkey event forwarder stopped cleanly"),
            Ok(Err(e)) => warn!(error = ?e, "Hotkey event forwarder task panicked"),
            Err(_) => debug!(
                "Hotkey event forwarder did not stop within timeout, \
                   will be cleaned up on exit"
            ),
        }

        Ok(())
    }

    /// Handle one hotkey event. Only presses of our hotkey are forwarded.
    pub(crate) async fn on_event(&self, id: u32, state: HotKeyState) -> AppResult<()> {
        if id != self.hotkey_id || state != HotKeyState::Pressed {
            return Ok(());
        }

        self.command_tx
            .send(AppCommand::Dismiss)
            .await
            .map_err(|e| AppError::ChannelSendFailed {
                message: format!("Failed to send Dismiss: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        info!("Dismiss hotkey pressed");
        Ok(())
    }
}
