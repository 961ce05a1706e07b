use crate::{
    ActionRunner, AudioKind, CoreError, DetectorCommand, DomainEvent, GestureAction, GestureKind,
    SessionConfig, SessionCoordinator, SessionDeps, SessionHandle, SessionInput, SessionState,
    SettingsKey, Trigger,
    tests::support::{
        FakeCamera, FakeCommitClient, FakeExecutor, FakeInjector, MemorySettings, RecordingSink,
    },
};

use std::{
    sync::{Arc, atomic::Ordering},
    time::Duration,
};

use tokio::{
    sync::{Notify, broadcast::error::RecvError},
    task::JoinHandle,
    time::Instant,
};

const SNAP: SessionInput = SessionInput::Detector(DomainEvent::AudioDetected(AudioKind::Snap));
const HEART: SessionInput = SessionInput::Detector(DomainEvent::GestureDetected(GestureKind::Heart));
const CONNECTED: SessionInput = SessionInput::Detector(DomainEvent::Connected);
const DISCONNECTED: SessionInput = SessionInput::Detector(DomainEvent::Disconnected);

struct Harness {
    handle: SessionHandle,
    sink: Arc<RecordingSink>,
    camera: Arc<FakeCamera>,
    executor: Arc<FakeExecutor>,
    task: JoinHandle<()>,
}

#[allow(clippy::unwrap_used)]
fn heart_settings(actions: Vec<GestureAction>) -> MemorySettings {
    MemorySettings::default()
        .with(SettingsKey::ProjectFolder, serde_json::json!("/tmp/project"))
        .with(
            SettingsKey::GestureActions(GestureKind::Heart),
            serde_json::to_value(actions).unwrap(),
        )
}

fn start(
    config: SessionConfig,
    permission_granted: bool,
    commits: FakeCommitClient,
    settings: MemorySettings,
) -> Harness {
    start_with(
        config,
        FakeCamera::new(permission_granted),
        commits,
        FakeExecutor::default(),
        settings,
    )
}

fn start_with(
    config: SessionConfig,
    camera: FakeCamera,
    commits: FakeCommitClient,
    executor: FakeExecutor,
    settings: MemorySettings,
) -> Harness {
    let sink = Arc::new(RecordingSink::default());
    let camera = Arc::new(camera);
    let executor = Arc::new(executor);
    let settings = Arc::new(settings);
    let runner = Arc::new(ActionRunner::new(
        Arc::new(commits),
        Arc::new(FakeInjector::new(true)),
        executor.clone(),
        settings.clone(),
    ));

    let deps = SessionDeps {
        commands: sink.clone(),
        camera: camera.clone(),
        settings,
        runner,
    };

    let (coordinator, handle) = SessionCoordinator::new(config, deps);
    let task = tokio::spawn(coordinator.run());

    Harness {
        handle,
        sink,
        camera,
        executor,
        task,
    }
}

/// Session whose heart command blocks until `gate` is notified.
fn start_gated(gate: Arc<Notify>) -> Harness {
    start_with(
        SessionConfig::default(),
        FakeCamera::new(true),
        FakeCommitClient::default(),
        FakeExecutor::gated(gate),
        heart_settings(vec![GestureAction::command("echo ok")]),
    )
}

fn start_default(settings: MemorySettings) -> Harness {
    start(
        SessionConfig::default(),
        true,
        FakeCommitClient::default(),
        settings,
    )
}

#[allow(clippy::unwrap_used)]
async fn wait_state(handle: &SessionHandle, wanted: impl Fn(&SessionState) -> bool) -> SessionState {
    let mut state = handle.state();
    let reached = tokio::time::timeout(Duration::from_secs(60), state.wait_for(|s| wanted(s)))
        .await
        .unwrap()
        .unwrap()
        .clone();
    reached
}

/// Lets every queued input and completion run; timers only fire once the
/// runtime is idle under paused time.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

#[allow(clippy::unwrap_used)]
async fn arm(harness: &Harness) {
    harness.handle.send(CONNECTED).await.unwrap();
    harness.handle.send(SNAP).await.unwrap();
    wait_state(&harness.handle, |s| *s == SessionState::DetectingGesture).await;
}

/// WHAT: Snap then heart runs the actions and resets after the delays
/// WHY: This is the whole happy path of a gesture session
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_snap_and_heart_when_actions_succeed_then_resets_to_listening() {
    // Given: A heart configured with one command
    let harness = start_default(heart_settings(vec![GestureAction::command("echo ok")]));
    let mut summaries = harness.handle.summaries();

    // When: Snap, then heart
    arm(&harness).await;
    assert_eq!(harness.camera.starts.load(Ordering::SeqCst), 1);
    harness.handle.send(HEART).await.unwrap();

    // Then: Success, followed by a reset after 3s + 0.5s
    wait_state(&harness.handle, |s| *s == SessionState::ActionsSucceeded).await;
    let succeeded_at = Instant::now();
    wait_state(&harness.handle, |s| *s == SessionState::Resetting).await;
    wait_state(&harness.handle, |s| *s == SessionState::ListeningForTrigger).await;
    assert!(succeeded_at.elapsed() >= Duration::from_millis(3500));

    let summary = summaries.recv().await.unwrap();
    assert_eq!(summary.gesture, GestureKind::Heart);
    assert_eq!(summary.success_count(), 1);

    assert_eq!(
        harness.sink.sent(),
        vec![
            DetectorCommand::EnableSnap,
            DetectorCommand::DisableSnap,
            DetectorCommand::EnableGesture,
            DetectorCommand::DisableGesture,
            DetectorCommand::EnableSnap,
        ]
    );
    assert_eq!(harness.sink.count(DetectorCommand::EnableSnap), 2);
    assert_eq!(harness.camera.stops.load(Ordering::SeqCst), 1);

    harness.handle.send(SessionInput::Shutdown).await.unwrap();
    harness.task.await.unwrap();
}

/// WHAT: A failed commit holds the session until dismissed
/// WHY: The user must see the commit error before the next session
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_commit_failure_when_actions_finish_then_held_until_window_closed() {
    // Given: A heart configured to commit, against a failing client
    let commits = FakeCommitClient {
        fail_commit: true,
        ..FakeCommitClient::default()
    };
    let harness = start(
        SessionConfig::default(),
        true,
        commits,
        heart_settings(vec![GestureAction::commit()]),
    );

    // When: Snap, then heart
    arm(&harness).await;
    harness.handle.send(HEART).await.unwrap();

    // Then: ActionsFailed carrying the commit error, with no automatic reset
    let failed =
        wait_state(&harness.handle, |s| matches!(s, SessionState::ActionsFailed(_))).await;
    assert!(matches!(&failed, SessionState::ActionsFailed(e) if e.kind == "commit"));

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(*harness.handle.state().borrow(), failed);

    // When: The window is closed
    harness.handle.send(SessionInput::WindowClosed).await.unwrap();

    // Then: Camera released and listening again
    wait_state(&harness.handle, |s| *s == SessionState::Resetting).await;
    wait_state(&harness.handle, |s| *s == SessionState::ListeningForTrigger).await;
    assert!(harness.camera.stops.load(Ordering::SeqCst) >= 1);
    assert_eq!(harness.sink.count(DetectorCommand::EnableSnap), 2);
}

/// WHAT: Spurious and non-target events are ignored while detecting
/// WHY: Only a target gesture may leave DetectingGesture
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_detecting_when_non_target_events_arrive_then_state_unchanged() {
    // Given: A session detecting gestures
    let harness = start_default(heart_settings(vec![GestureAction::command("echo ok")]));
    arm(&harness).await;

    // When: A second snap, a gesture loss, a non-target gesture and a hand count
    for input in [
        SNAP,
        SessionInput::Detector(DomainEvent::GestureLost(GestureKind::Heart)),
        SessionInput::Detector(DomainEvent::GestureDetected(GestureKind::Peace)),
        SessionInput::Detector(DomainEvent::HandCount(2)),
    ] {
        harness.handle.send(input).await.unwrap();
    }
    settle().await;

    // Then: Still detecting, no extra commands or permission prompts
    assert_eq!(
        *harness.handle.state().borrow(),
        SessionState::DetectingGesture
    );
    assert_eq!(
        harness.sink.sent(),
        vec![
            DetectorCommand::EnableSnap,
            DetectorCommand::DisableSnap,
            DetectorCommand::EnableGesture,
        ]
    );
    assert_eq!(harness.camera.permission_requests.load(Ordering::SeqCst), 1);
}

/// WHAT: Denied camera permission returns to listening
/// WHY: The trigger must be re-armed when the camera cannot start
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_permission_denied_when_triggered_then_listening_with_trigger_reenabled() {
    // Given: A camera that refuses permission
    let harness = start(
        SessionConfig::default(),
        false,
        FakeCommitClient::default(),
        MemorySettings::default(),
    );

    // When: Connected, then a snap
    harness.handle.send(CONNECTED).await.unwrap();
    harness.handle.send(SNAP).await.unwrap();
    settle().await;

    // Then: Listening, camera never started, snap detection re-enabled
    assert_eq!(
        *harness.handle.state().borrow(),
        SessionState::ListeningForTrigger
    );
    assert_eq!(harness.camera.starts.load(Ordering::SeqCst), 0);
    assert_eq!(
        harness.sink.sent(),
        vec![
            DetectorCommand::EnableSnap,
            DetectorCommand::DisableSnap,
            DetectorCommand::EnableSnap,
        ]
    );
}

/// WHAT: Closing the window while detecting aborts the session
/// WHY: Target detection must be switched off before listening again
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_detecting_when_window_closed_then_gesture_disabled_and_listening() {
    // Given: A session detecting gestures
    let harness = start_default(MemorySettings::default());
    arm(&harness).await;

    // When: The window is closed
    harness.handle.send(SessionInput::WindowClosed).await.unwrap();

    // Then: Camera stopped, gesture detection disabled, trigger re-enabled
    wait_state(&harness.handle, |s| *s == SessionState::Resetting).await;
    wait_state(&harness.handle, |s| *s == SessionState::ListeningForTrigger).await;
    assert_eq!(harness.camera.stops.load(Ordering::SeqCst), 1);
    assert_eq!(
        harness.sink.sent(),
        vec![
            DetectorCommand::EnableSnap,
            DetectorCommand::DisableSnap,
            DetectorCommand::EnableGesture,
            DetectorCommand::DisableGesture,
            DetectorCommand::EnableSnap,
        ]
    );
}

/// WHAT: Closing the window while listening changes nothing
/// WHY: There is no session to reset
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_listening_when_window_closed_then_no_reset() {
    let harness = start_default(MemorySettings::default());
    harness.handle.send(CONNECTED).await.unwrap();

    harness.handle.send(SessionInput::WindowClosed).await.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(
        *harness.handle.state().borrow(),
        SessionState::ListeningForTrigger
    );
    assert_eq!(harness.sink.sent(), vec![DetectorCommand::EnableSnap]);
}

/// WHAT: Losing the detector mid-session returns to listening
/// WHY: Connectivity loss releases the camera and resets the session
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_detecting_when_disconnected_then_listening_and_rearmed_on_reconnect() {
    // Given: A session detecting gestures
    let harness = start_default(MemorySettings::default());
    arm(&harness).await;

    // When: The detector drops
    harness
        .handle
        .send(SessionInput::Detector(DomainEvent::Disconnected))
        .await
        .unwrap();
    settle().await;

    // Then: Listening with the camera released
    assert_eq!(
        *harness.handle.state().borrow(),
        SessionState::ListeningForTrigger
    );
    assert_eq!(harness.camera.stops.load(Ordering::SeqCst), 1);

    // When: It comes back
    harness.handle.send(CONNECTED).await.unwrap();
    settle().await;

    // Then: The trigger is enabled again
    assert_eq!(harness.sink.count(DetectorCommand::EnableSnap), 2);
}

/// WHAT: A gesture trigger is never also a target
/// WHY: The same gesture cannot both arm and fire a session
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_gesture_trigger_in_targets_when_created_then_trigger_removed_from_targets() {
    // Given: Peace triggers, heart and peace are targets
    let config = SessionConfig {
        trigger: Trigger::Gesture(GestureKind::Peace),
        targets: vec![GestureKind::Heart, GestureKind::Peace],
        ..SessionConfig::default()
    };
    let harness = start(config, true, FakeCommitClient::default(), MemorySettings::default());
    let peace = SessionInput::Detector(DomainEvent::GestureDetected(GestureKind::Peace));

    // When: Peace arms the camera, then peace is shown again
    harness.handle.send(CONNECTED).await.unwrap();
    harness.handle.send(peace).await.unwrap();
    wait_state(&harness.handle, |s| *s == SessionState::DetectingGesture).await;
    harness.handle.send(peace).await.unwrap();
    settle().await;

    // Then: The second peace is ignored and the trigger used the peace commands
    assert_eq!(
        *harness.handle.state().borrow(),
        SessionState::DetectingGesture
    );
    assert_eq!(
        harness.sink.sent(),
        vec![
            DetectorCommand::EnablePeace,
            DetectorCommand::DisablePeace,
            DetectorCommand::EnableGesture,
        ]
    );
}

/// WHAT: Shutdown stops the coordinator and releases the camera
/// WHY: The camera must never outlive the application
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_camera_live_when_shutdown_then_task_ends_and_camera_stopped() {
    let harness = start_default(MemorySettings::default());
    arm(&harness).await;

    harness.handle.send(SessionInput::Shutdown).await.unwrap();
    harness.task.await.unwrap();

    assert_eq!(harness.camera.stops.load(Ordering::SeqCst), 1);
    assert!(harness.handle.send(SNAP).await.is_err());
}

/// WHAT: A trigger that arrives after the detector dropped is ignored
/// WHY: Arming the camera without a detector would leave a session nobody can finish
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_detector_disconnected_when_trigger_arrives_then_session_not_armed() {
    // Given: A detector that connected and then dropped
    let harness = start_default(MemorySettings::default());
    harness.handle.send(CONNECTED).await.unwrap();
    harness.handle.send(DISCONNECTED).await.unwrap();

    // When: A snap from before the drop is delivered
    harness.handle.send(SNAP).await.unwrap();
    settle().await;

    // Then: Still listening, no permission prompt, no camera, no commands
    assert_eq!(
        *harness.handle.state().borrow(),
        SessionState::ListeningForTrigger
    );
    assert_eq!(harness.camera.permission_requests.load(Ordering::SeqCst), 0);
    assert_eq!(harness.camera.starts.load(Ordering::SeqCst), 0);
    assert_eq!(harness.sink.sent(), vec![DetectorCommand::EnableSnap]);
}

/// WHAT: A new session cannot start while the previous run is still executing
/// WHY: At most one action run may be in flight
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_run_in_flight_when_dismissed_and_retriggered_then_runner_invoked_once() {
    // Given: A heart run blocked inside its command
    let gate = Arc::new(Notify::new());
    let harness = start_gated(gate.clone());
    arm(&harness).await;
    harness.handle.send(HEART).await.unwrap();
    wait_state(&harness.handle, |s| *s == SessionState::RunningActions).await;

    // When: The window is closed, the reset completes, then snap and heart arrive
    harness.handle.send(SessionInput::WindowClosed).await.unwrap();
    wait_state(&harness.handle, |s| *s == SessionState::ListeningForTrigger).await;
    harness.handle.send(SNAP).await.unwrap();
    harness.handle.send(HEART).await.unwrap();
    settle().await;

    // Then: The snap is ignored and the command ran exactly once
    assert_eq!(
        *harness.handle.state().borrow(),
        SessionState::ListeningForTrigger
    );
    assert_eq!(harness.executor.calls(), vec!["echo ok".to_string()]);
    assert_eq!(harness.camera.permission_requests.load(Ordering::SeqCst), 1);
    assert_eq!(
        harness.sink.sent(),
        vec![
            DetectorCommand::EnableSnap,
            DetectorCommand::DisableSnap,
            DetectorCommand::EnableGesture,
            DetectorCommand::DisableGesture,
            DetectorCommand::EnableSnap,
        ]
    );

    gate.notify_one();
}

/// WHAT: Results of a dismissed run are published but do not move the session
/// WHY: The user already started over; a late success must not schedule a reset
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_dismissed_run_when_actions_finish_late_then_summary_published_and_state_kept() {
    // Given: A heart run that was dismissed while still executing
    let gate = Arc::new(Notify::new());
    let harness = start_gated(gate.clone());
    let mut summaries = harness.handle.summaries();
    arm(&harness).await;
    harness.handle.send(HEART).await.unwrap();
    wait_state(&harness.handle, |s| *s == SessionState::RunningActions).await;
    harness.handle.send(SessionInput::WindowClosed).await.unwrap();
    wait_state(&harness.handle, |s| *s == SessionState::ListeningForTrigger).await;

    // When: The run finishes
    gate.notify_one();
    let summary = summaries.recv().await.unwrap();

    // Then: The summary is delivered and the session stays idle past the reset delay
    assert_eq!(summary.gesture, GestureKind::Heart);
    assert_eq!(summary.success_count(), 1);
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(
        *harness.handle.state().borrow(),
        SessionState::ListeningForTrigger
    );
    assert_eq!(harness.sink.count(DetectorCommand::EnableSnap), 2);

    // And: A new trigger arms the camera again
    harness.handle.send(SNAP).await.unwrap();
    wait_state(&harness.handle, |s| *s == SessionState::DetectingGesture).await;
    assert_eq!(harness.camera.permission_requests.load(Ordering::SeqCst), 2);
}

/// WHAT: A second permission request is not issued while one is outstanding
/// WHY: The OS prompt must appear at most once per pending request
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_permission_outstanding_when_reconnected_and_retriggered_then_single_request() {
    // Given: A camera whose permission prompt is never answered
    let harness = start_with(
        SessionConfig::default(),
        FakeCamera::unanswered(),
        FakeCommitClient::default(),
        FakeExecutor::default(),
        MemorySettings::default(),
    );
    harness.handle.send(CONNECTED).await.unwrap();
    harness.handle.send(SNAP).await.unwrap();
    wait_state(&harness.handle, |s| *s == SessionState::TriggerDetected).await;

    // When: The detector reconnects and snaps again
    harness.handle.send(CONNECTED).await.unwrap();
    harness.handle.send(SNAP).await.unwrap();
    settle().await;

    // Then: Listening, with only the first request issued
    assert_eq!(
        *harness.handle.state().borrow(),
        SessionState::ListeningForTrigger
    );
    assert_eq!(harness.camera.permission_requests.load(Ordering::SeqCst), 1);
    assert_eq!(
        harness.sink.sent(),
        vec![
            DetectorCommand::EnableSnap,
            DetectorCommand::DisableSnap,
            DetectorCommand::EnableSnap,
        ]
    );
}

/// WHAT: A reconnect during an action run re-enables the trigger only after the reset
/// WHY: Snaps must not be detected while actions are still executing
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_run_in_flight_when_connected_then_trigger_enabled_after_reset() {
    // Given: A heart run blocked inside its command
    let gate = Arc::new(Notify::new());
    let harness = start_gated(gate.clone());
    arm(&harness).await;
    harness.handle.send(HEART).await.unwrap();
    wait_state(&harness.handle, |s| *s == SessionState::RunningActions).await;

    // When: The detector reports a fresh connection
    harness.handle.send(CONNECTED).await.unwrap();
    settle().await;

    // Then: The run continues and snap detection stays off
    assert_eq!(
        *harness.handle.state().borrow(),
        SessionState::RunningActions
    );
    assert_eq!(harness.sink.count(DetectorCommand::EnableSnap), 1);

    // When: The run finishes and the reset delays pass
    gate.notify_one();
    wait_state(&harness.handle, |s| *s == SessionState::ListeningForTrigger).await;

    // Then: Snap detection is enabled exactly once more
    assert_eq!(
        harness.sink.sent(),
        vec![
            DetectorCommand::EnableSnap,
            DetectorCommand::DisableSnap,
            DetectorCommand::EnableGesture,
            DetectorCommand::DisableGesture,
            DetectorCommand::EnableSnap,
        ]
    );
}

/// WHAT: Send errors point at the caller, not at the coordinator
/// WHY: The error location is what identifies the failing call site in logs
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_coordinator_stopped_when_sending_then_error_located_at_caller() {
    // Given: A stopped coordinator
    let harness = start_default(MemorySettings::default());
    harness.handle.send(SessionInput::Shutdown).await.unwrap();
    harness.task.await.unwrap();

    // When: Sending another input
    let line = line!() + 1;
    let result = harness.handle.send(SNAP).await;

    // Then: ChannelSendFailed, located on the line above
    assert!(matches!(
        result,
        Err(CoreError::ChannelSendFailed { location, .. })
            if location.file == file!() && location.line == line
    ));
}

/// WHAT: The summary stream closes once the coordinator stops
/// WHY: Subscribers use the closed stream to shut down
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_handle_alive_when_coordinator_stops_then_summary_stream_closed() {
    // Given: A subscriber while the handle stays alive
    let harness = start_default(MemorySettings::default());
    let mut summaries = harness.handle.summaries();

    // When: The coordinator shuts down
    harness.handle.send(SessionInput::Shutdown).await.unwrap();
    harness.task.await.unwrap();

    // Then: The stream reports closed instead of waiting forever
    assert!(matches!(summaries.recv().await, Err(RecvError::Closed)));
    assert!(matches!(
        harness.handle.summaries().recv().await,
        Err(RecvError::Closed)
    ));
}
