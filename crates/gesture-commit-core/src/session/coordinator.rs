//! Gesture session coordinator.
//!
//! A single task owns the [`SessionState`] and applies every transition.
//! Slow work (camera permission, action runs, reset timers) runs in spawned
//! tasks that post a completion back onto the coordinator's own queue, so
//! detector events keep being processed while a wait is outstanding.

use crate::{
    CoreError, CoreResult,
    actions::{ActionRunner, ExecutionSummary},
    protocol::{DetectorCommand, DomainEvent, GestureKind},
    session::{CameraController, SessionConfig, SessionInput, SessionState},
    settings::{self, SettingsStore},
    transport::CommandSink,
};

use std::{panic::Location, sync::Arc, time::Duration};

use error_location::ErrorLocation;
use tokio::{
    sync::{broadcast, mpsc, watch},
    task::JoinHandle,
};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

const INPUT_CAPACITY: usize = 64;
const SUMMARY_CAPACITY: usize = 16;

/// Collaborators the coordinator is constructed with.
pub struct SessionDeps {
    /// Outbound detector commands.
    pub commands: Arc<dyn CommandSink>,
    /// Camera permission and capture session.
    pub camera: Arc<dyn CameraController>,
    /// Persisted settings, read when actions are due.
    pub settings: Arc<dyn SettingsStore>,
    /// Executes the configured actions.
    pub runner: Arc<ActionRunner>,
}

/// Cloneable handle for feeding and observing a running coordinator.
///
/// Holds no sender of its own, so the state and summary streams close once
/// the coordinator stops.
pub struct SessionHandle {
    inputs: mpsc::Sender<SessionInput>,
    state: watch::Receiver<SessionState>,
    summaries: broadcast::Receiver<Arc<ExecutionSummary>>,
}

impl Clone for SessionHandle {
    fn clone(&self) -> Self {
        Self {
            inputs: self.inputs.clone(),
            state: self.state.clone(),
            summaries: self.summaries.resubscribe(),
        }
    }
}

impl SessionHandle {
    /// Sender for detector events and UI intents.
    pub fn inputs(&self) -> mpsc::Sender<SessionInput> {
        self.inputs.clone()
    }

    /// Queue one input.
    #[track_caller]
    pub fn send(&self, input: SessionInput) -> impl Future<Output = CoreResult<()>> + Send + '_ {
        let location = ErrorLocation::from(Location::caller());

        async move {
            self.inputs
                .send(input)
                .await
                .map_err(|e| CoreError::ChannelSendFailed {
                    message: format!("Failed to send {:?}: coordinator stopped", e.0),
                    location,
                })
        }
    }

    /// Watch the current session state.
    pub fn state(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// Receive the summary of every action run completed after this call.
    pub fn summaries(&self) -> broadcast::Receiver<Arc<ExecutionSummary>> {
        self.summaries.resubscribe()
    }
}

enum Completion {
    PermissionResolved { granted: bool },
    ActionsFinished { session_id: Uuid, summary: ExecutionSummary },
    ResetDue { generation: u64 },
    ResetSettled { generation: u64 },
}

/// Owns the session state machine. Drive it with [`SessionCoordinator::run`].
pub struct SessionCoordinator {
    config: SessionConfig,
    deps: SessionDeps,
    state: SessionState,
    state_tx: watch::Sender<SessionState>,
    summary_tx: broadcast::Sender<Arc<ExecutionSummary>>,
    inputs_rx: mpsc::Receiver<SessionInput>,
    completion_tx: mpsc::UnboundedSender<Completion>,
    completion_rx: mpsc::UnboundedReceiver<Completion>,
    session_id: Option<Uuid>,
    detector_connected: bool,
    camera_visible: bool,
    target_detection_enabled: bool,
    permission_pending: bool,
    runner_in_flight: bool,
    hand_count: u32,
    timer: Option<JoinHandle<()>>,
    timer_generation: u64,
}

impl SessionCoordinator {
    /// Build a coordinator in `ListeningForTrigger` and its handle.
    pub fn new(mut config: SessionConfig, deps: SessionDeps) -> (Self, SessionHandle) {
        if let crate::session::Trigger::Gesture(trigger) = config.trigger {
            if config.targets.contains(&trigger) {
                warn!(gesture = %trigger, "Trigger gesture removed from target set");
                config.targets.retain(|t| *t != trigger);
            }
        }

        let (inputs_tx, inputs_rx) = mpsc::channel(INPUT_CAPACITY);
        let (state_tx, state_rx) = watch::channel(SessionState::ListeningForTrigger);
        let (summary_tx, summary_rx) = broadcast::channel(SUMMARY_CAPACITY);
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();

        let handle = SessionHandle {
            inputs: inputs_tx,
            state: state_rx,
            summaries: summary_rx,
        };

        let coordinator = Self {
            config,
            deps,
            state: SessionState::ListeningForTrigger,
            state_tx,
            summary_tx,
            inputs_rx,
            completion_tx,
            completion_rx,
            session_id: None,
            detector_connected: false,
            camera_visible: false,
            target_detection_enabled: false,
            permission_pending: false,
            runner_in_flight: false,
            hand_count: 0,
            timer: None,
            timer_generation: 0,
        };

        (coordinator, handle)
    }

    /// Process inputs until [`SessionInput::Shutdown`] or every handle is dropped.
    #[instrument(skip(self), fields(trigger = %self.config.trigger))]
    pub async fn run(mut self) {
        info!(targets = ?self.config.targets, "Session coordinator starting");

        loop {
            tokio::select! {
                Some(completion) = self.completion_rx.recv() => {
                    self.handle_completion(completion).await;
                }

                input = self.inputs_rx.recv() => match input {
                    Some(SessionInput::Detector(event)) => self.handle_event(event).await,
                    Some(SessionInput::WindowClosed) => self.handle_window_closed().await,
                    Some(SessionInput::Shutdown) | None => {
                        info!("Session coordinator shutting down");
                        break;
                    }
                },
            }
        }

        self.cancel_timer();
        if self.camera_visible {
            self.deps.camera.stop_camera().await;
        }
    }

    async fn handle_event(&mut self, event: DomainEvent) {
        match event {
            DomainEvent::Connected => self.on_connected().await,
            DomainEvent::Disconnected => self.on_disconnected().await,
            DomainEvent::HandCount(count) => {
                if count != self.hand_count {
                    debug!(hands = count, "Hand count changed");
                }
                self.hand_count = count;
            }
            DomainEvent::GestureLost(kind) => {
                debug!(gesture = %kind, state = ?self.state, "Gesture lost");
            }
            event if self.config.trigger.matches(&event) => self.on_trigger().await,
            DomainEvent::GestureDetected(kind) => self.on_gesture(kind).await,
            DomainEvent::AudioDetected(kind) => {
                debug!(audio = %kind, "Ignoring non-trigger audio event");
            }
        }
    }

    async fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::PermissionResolved { granted } => self.on_permission(granted).await,
            Completion::ActionsFinished {
                session_id,
                summary,
            } => self.on_actions_finished(session_id, summary),
            Completion::ResetDue { generation } => {
                if generation != self.timer_generation {
                    debug!(generation, "Stale reset timer ignored");
                    return;
                }
                if matches!(
                    self.state,
                    SessionState::ActionsSucceeded | SessionState::ActionsFailed(_)
                ) {
                    self.begin_reset().await;
                }
            }
            Completion::ResetSettled { generation } => {
                if generation != self.timer_generation || self.state != SessionState::Resetting {
                    debug!(generation, "Stale reset settle ignored");
                    return;
                }
                self.timer = None;
                self.transition(SessionState::ListeningForTrigger);
                self.session_id = None;
                self.send(self.config.trigger.enable_command()).await;
            }
        }
    }

    async fn on_connected(&mut self) {
        // Detector restarted: its detectors are in an unknown state.
        self.detector_connected = true;
        self.target_detection_enabled = false;

        if self.state == SessionState::RunningActions {
            info!("Detector connected during action run, trigger re-enabled after reset");
            return;
        }

        self.cancel_timer();
        self.release_camera().await;
        self.transition(SessionState::ListeningForTrigger);
        self.send(self.config.trigger.enable_command()).await;
    }

    async fn on_disconnected(&mut self) {
        self.detector_connected = false;
        self.target_detection_enabled = false;
        self.release_camera().await;

        if self.state == SessionState::RunningActions {
            info!("Detector disconnected during action run, run continues");
            return;
        }

        self.cancel_timer();
        self.transition(SessionState::ListeningForTrigger);
    }

    async fn on_trigger(&mut self) {
        if !self.detector_connected {
            warn!("Trigger ignored, detector not connected");
            return;
        }
        if self.state != SessionState::ListeningForTrigger {
            info!(state = ?self.state, "Trigger ignored, session already in progress");
            return;
        }
        if self.runner_in_flight {
            info!("Trigger ignored, previous actions still running");
            return;
        }
        if self.permission_pending {
            debug!("Trigger ignored, camera permission request outstanding");
            return;
        }

        let session_id = Uuid::new_v4();
        self.session_id = Some(session_id);
        info!(session_id = %session_id, "Trigger detected");

        self.transition(SessionState::TriggerDetected);
        self.send(self.config.trigger.disable_command()).await;

        self.permission_pending = true;
        let camera = Arc::clone(&self.deps.camera);
        let completion_tx = self.completion_tx.clone();
        tokio::spawn(async move {
            let granted = camera.request_permission().await;
            let _ = completion_tx.send(Completion::PermissionResolved { granted });
        });
    }

    async fn on_permission(&mut self, granted: bool) {
        self.permission_pending = false;

        if self.state != SessionState::TriggerDetected {
            debug!(granted, state = ?self.state, "Camera permission answer arrived late, ignored");
            return;
        }

        if !granted {
            warn!("Camera permission denied");
            self.transition(SessionState::ListeningForTrigger);
            self.session_id = None;
            self.send(self.config.trigger.enable_command()).await;
            return;
        }

        self.transition(SessionState::ArmingCamera);
        self.send(DetectorCommand::EnableGesture).await;
        self.target_detection_enabled = true;
        self.deps.camera.start_camera().await;
        self.camera_visible = true;
        self.transition(SessionState::DetectingGesture);
    }

    async fn on_gesture(&mut self, kind: GestureKind) {
        if self.state != SessionState::DetectingGesture {
            debug!(gesture = %kind, state = ?self.state, "Gesture ignored outside detection");
            return;
        }
        if !self.config.targets.contains(&kind) {
            debug!(gesture = %kind, "Gesture is not a target, ignored");
            return;
        }

        let session_id = self.session_id.unwrap_or_else(Uuid::new_v4);
        info!(session_id = %session_id, gesture = %kind, "Target gesture detected");

        self.transition(SessionState::GestureDetectedPending);
        self.send(DetectorCommand::DisableGesture).await;
        self.target_detection_enabled = false;

        let actions = settings::load_gesture_actions(self.deps.settings.as_ref(), kind).await;

        self.transition(SessionState::RunningActions);
        self.runner_in_flight = true;

        let runner = Arc::clone(&self.deps.runner);
        let completion_tx = self.completion_tx.clone();
        tokio::spawn(async move {
            let summary = runner.run(kind, &actions).await;
            let _ = completion_tx.send(Completion::ActionsFinished {
                session_id,
                summary,
            });
        });
    }

    fn on_actions_finished(&mut self, session_id: Uuid, summary: ExecutionSummary) {
        self.runner_in_flight = false;

        let summary = Arc::new(summary);
        let _ = self.summary_tx.send(Arc::clone(&summary));

        if self.state != SessionState::RunningActions {
            info!(session_id = %session_id, "Actions finished after the session was dismissed");
            return;
        }

        match summary.critical_failure() {
            Some(error) => {
                warn!(session_id = %session_id, error = %error, "Commit failed, waiting for dismissal");
                self.transition(SessionState::ActionsFailed(error));
            }
            None => {
                self.transition(SessionState::ActionsSucceeded);
                self.schedule(self.config.reset_delay, |generation| Completion::ResetDue {
                    generation,
                });
            }
        }
    }

    async fn handle_window_closed(&mut self) {
        self.cancel_timer();
        // Release the camera before any transition, whatever the state.
        self.deps.camera.stop_camera().await;
        self.camera_visible = false;

        if self.state.is_idle() {
            debug!("Window closed while listening, nothing to reset");
            return;
        }

        self.begin_reset().await;
    }

    async fn begin_reset(&mut self) {
        self.cancel_timer();
        self.transition(SessionState::Resetting);
        self.release_camera().await;

        if self.target_detection_enabled {
            self.send(DetectorCommand::DisableGesture).await;
            self.target_detection_enabled = false;
        }

        self.schedule(self.config.reset_settle_delay, |generation| {
            Completion::ResetSettled { generation }
        });
    }

    async fn release_camera(&mut self) {
        if self.camera_visible {
            self.deps.camera.stop_camera().await;
            self.camera_visible = false;
        }
    }

    fn schedule(&mut self, delay: Duration, completion: fn(u64) -> Completion) {
        self.cancel_timer();

        let generation = self.timer_generation;
        let completion_tx = self.completion_tx.clone();
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = completion_tx.send(completion(generation));
        }));
    }

    // Bumping the generation also invalidates a completion that already fired
    // but has not been processed yet.
    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.timer_generation = self.timer_generation.wrapping_add(1);
    }

    fn transition(&mut self, to: SessionState) {
        if self.state == to {
            return;
        }
        info!(from = ?self.state, to = ?to, "Session transition");
        self.state = to.clone();
        self.state_tx.send_replace(to);
    }

    async fn send(&self, command: DetectorCommand) {
        if let Err(e) = self.deps.commands.send_command(command).await {
            warn!(command = command.as_wire(), error = %e, "Failed to send detector command");
        }
    }
}
