use crate::{AppCommand, AppResult, Notifier, TrayCommand, TrayIconState, TrayMenuIds};

use std::path::PathBuf;

use gesture_commit_core::{
    CommandSink, ConnectionState, DetectorCommand, ExecutionSummary, SessionHandle, SessionInput,
    SessionState, WebSocketTransport,
};
use tao::event_loop::EventLoopProxy;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{error, info, instrument, warn};
use tray_icon::menu::MenuEvent;

/// Main application state.
///
/// Runs on the async runtime thread. Tray updates go back to the main
/// thread through `tray_proxy` because `TrayIcon` is `!Send` and must
/// remain on the UI thread.
pub struct App {
    pub(crate) transport: WebSocketTransport,
    pub(crate) session: SessionHandle,
    pub(crate) notifier: Notifier,
    pub(crate) tray_proxy: EventLoopProxy<TrayCommand>,
    pub(crate) config_path: PathBuf,
    pub(crate) command_tx: mpsc::Sender<AppCommand>,
    pub(crate) command_rx: mpsc::Receiver<AppCommand>,
    pub(crate) shutdown_tx: watch::Sender<bool>,
    pub(crate) menu_ids: TrayMenuIds,
}

/// Presentation state derived from the session and the detector link.
#[derive(Debug, Default)]
pub(crate) struct Presentation {
    connected: bool,
    last_commit_url: Option<String>,
}

impl Presentation {
    /// Tray update for the current session state.
    pub(crate) fn tray_command(&self, state: &SessionState) -> TrayCommand {
        TrayCommand::SetState(TrayIconState::from_session(state, self.connected))
    }

    /// Record a connectivity change.
    pub(crate) fn set_connection(&mut self, state: ConnectionState) {
        self.connected = state == ConnectionState::Connected;
    }

    /// Remember the commit URL of a finished run, if it produced one.
    pub(crate) fn record_summary(&mut self, summary: &ExecutionSummary) {
        if let Some(url) = summary.commit_url() {
            self.last_commit_url = Some(url.to_string());
        }
    }

    /// URL of the most recent commit or pull request.
    pub(crate) fn last_commit_url(&self) -> Option<&str> {
        self.last_commit_url.as_deref()
    }
}

impl App {
    /// Run the main application event loop.
    #[instrument(skip(self))]
    pub(crate) async fn run(mut self) -> AppResult<()> {
        info!("Gesture-Commit starting");

        // MenuEvent::receiver() blocks in recv(); dropping tray_event_rx
        // makes the next blocking_send fail and ends the task.
        let (tray_event_tx, mut tray_event_rx) = mpsc::channel(32);
        let tray_handle = tokio::task::spawn_blocking(move || {
            let receiver = MenuEvent::receiver();
            while let Ok(event) = receiver.recv() {
                if tray_event_tx.blocking_send(event).is_err() {
                    break;
                }
            }
        });

        let mut presentation = Presentation::default();
        let mut session_state = self.session.state();
        let mut summaries = self.session.summaries();
        let mut connection = self.transport.subscribe_state();
        presentation.set_connection(self.transport.state().await);
        self.refresh_tray(&presentation, &session_state.borrow().clone());

        loop {
            tokio::select! {
                Some(event) = tray_event_rx.recv() => {
                    self.handle_tray_event(event).await;
                }

                Some(cmd) = self.command_rx.recv() => {
                    if cmd == AppCommand::Shutdown {
                        info!("Shutdown requested");
                        break;
                    }
                    self.handle_command(cmd, &presentation).await;
                }

                changed = session_state.changed() => {
                    if changed.is_err() {
                        info!("Session coordinator stopped, shutting down");
                        break;
                    }
                    let state = session_state.borrow_and_update().clone();
                    self.refresh_tray(&presentation, &state);
                }

                summary = summaries.recv() => match summary {
                    Ok(summary) => {
                        presentation.record_summary(&summary);
                        self.notifier.notify_summary(&summary).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Missed execution summaries");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!("Summary stream closed, shutting down");
                        break;
                    }
                },

                state = connection.recv() => match state {
                    Ok(state) => {
                        presentation.set_connection(state);
                        self.refresh_tray(&presentation, &session_state.borrow().clone());
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => {
                        presentation.set_connection(self.transport.state().await);
                    }
                    Err(broadcast::error::RecvError::Closed) => {}
                },
            }
        }

        drop(tray_event_rx);

        match tokio::time::timeout(std::time::Duration::from_secs(1), tray_handle).await {
            Ok(Ok(())) => info!("Tray event forwarder stopped cleanly"),
            Ok(Err(e)) => error!(error = ?e, "Tray event forwarder task panicked"),
            Err(_) => info!(
                "Tray event forwarder did not stop within timeout, \
                     will be cleaned up on exit"
            ),
        }

        if let Err(e) = self.session.send(SessionInput::Shutdown).await {
            warn!(error = %e, "Session coordinator already stopped");
        }
        self.transport.disconnect().await;
        let _ = self.shutdown_tx.send(true);
        let _ = self.tray_proxy.send_event(TrayCommand::Shutdown);

        info!("Gesture-Commit shut down successfully");

        Ok(())
    }

    #[instrument(skip(self, presentation))]
    async fn handle_command(&self, cmd: AppCommand, presentation: &Presentation) {
        match cmd {
            AppCommand::Dismiss => {
                if let Err(e) = self.session.send(SessionInput::WindowClosed).await {
                    error!(error = %e, "Failed to dismiss session");
                }
            }
            AppCommand::CalibrateSnap => {
                match self.transport.send_command(DetectorCommand::CalibrateSnap).await {
                    Ok(()) => info!("Snap calibration requested"),
                    Err(e) => {
                        warn!(error = %e, "Snap calibration not sent");
                        self.notifier
                            .notify(
                                "Calibrate Snap".to_string(),
                                "The gesture detector is not connected.".to_string(),
                            )
                            .await;
                    }
                }
            }
            AppCommand::OpenLastCommit => match presentation.last_commit_url() {
                Some(url) => {
                    if let Err(e) = open::that(url) {
                        error!(url, error = %e, "Failed to open commit URL");
                    }
                }
                None => info!("No commit yet"),
            },
            AppCommand::Shutdown => {}
        }
    }

    /// Map tray menu clicks onto application commands.
    #[instrument(skip(self))]
    async fn handle_tray_event(&self, event: MenuEvent) {
        let id = &event.id;

        let cmd = if *id == self.menu_ids.dismiss {
            AppCommand::Dismiss
        } else if *id == self.menu_ids.calibrate_snap {
            AppCommand::CalibrateSnap
        } else if *id == self.menu_ids.open_last_commit {
            AppCommand::OpenLastCommit
        } else if *id == self.menu_ids.settings {
            if let Err(e) = open::that(&self.config_path) {
                error!(path = ?self.config_path, error = %e, "Failed to open settings");
            } else {
                info!("Opened settings file");
            }
            return;
        } else if *id == self.menu_ids.exit {
            info!("Exit requested from tray menu");
            AppCommand::Shutdown
        } else {
            return;
        };

        if let Err(e) = self.command_tx.send(cmd).await {
            error!(error = ?e, "Failed to queue tray command");
        }
    }

    fn refresh_tray(&self, presentation: &Presentation, state: &SessionState) {
        if self
            .tray_proxy
            .send_event(presentation.tray_command(state))
            .is_err()
        {
            warn!("Tray event loop closed");
        }
    }
}
