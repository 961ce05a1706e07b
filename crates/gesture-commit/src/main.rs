//! Gesture-Commit: trigger commits, shortcuts and commands with hand gestures.

mod app;
mod app_command;
mod camera_session;
mod config;
mod error;
mod git_client;
mod hotkey_handler;
mod modifier_guard;
mod notifier;
mod settings_store;
mod shell_executor;
mod shortcut_injector;
mod tray_command;
mod tray_icon_state;
mod tray_manager;

pub(crate) use {
    app::App,
    app_command::AppCommand,
    camera_session::CameraSession,
    error::{AppError, Result as AppResult},
    git_client::GitCliClient,
    hotkey_handler::HotkeyHandler,
    modifier_guard::ModifierGuard,
    notifier::Notifier,
    settings_store::ConfigSettingsStore,
    shell_executor::ShellExecutor,
    shortcut_injector::EnigoInjector,
    tray_command::TrayCommand,
    tray_icon_state::TrayIconState,
    tray_manager::{TrayManager, TrayMenuIds},
};

use crate::config::Config;

use std::sync::Arc;

use gesture_commit_core::{
    ActionRunner, SessionCoordinator, SessionDeps, SettingsStore, WebSocketTransport,
    forward_transport_events,
};
use global_hotkey::GlobalHotKeyManager;
use tao::{
    event::Event,
    event_loop::{ControlFlow, EventLoopBuilder},
};
use tokio::sync::{Mutex, mpsc, watch};
use tracing::error;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "gesture_commit=debug,gesture_commit_core=debug";

/// Application entry point.
fn main() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let event_loop = EventLoopBuilder::<TrayCommand>::with_user_event().build();
    let tray_proxy = event_loop.create_proxy();

    // TrayManager lives on the main thread - TrayIcon is !Send on all platforms.
    let mut tray_manager = match TrayManager::new() {
        Ok(tm) => tm,
        Err(e) => {
            error!("Failed to create TrayManager: {:?}", e);
            std::process::exit(1);
        }
    };

    // Dropping the manager unregisters the hotkey.
    let mut hotkey_manager: Option<GlobalHotKeyManager> = None;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;

        match event {
            Event::UserEvent(cmd) => {
                match cmd {
                    TrayCommand::SetState(state) => {
                        if let Err(e) = tray_manager.update_state(state) {
                            error!(error = ?e, "Failed to update tray icon");
                        }
                    }
                    TrayCommand::Shutdown => {
                        *control_flow = ControlFlow::ExitWithCode(0);
                    }
                }
                return;
            }
            Event::NewEvents(tao::event::StartCause::Init) => {
                let config_path = match Config::path() {
                    Ok(p) => p,
                    Err(e) => {
                        error!("Failed to resolve config path: {:?}", e);
                        std::process::exit(1);
                    }
                };

                let config = match Config::load_from(&config_path) {
                    Ok(c) => c,
                    Err(e) => {
                        error!("Failed to load config: {:?}", e);
                        std::process::exit(1);
                    }
                };

                if let Err(e) = config.validate_detector_url() {
                    error!("Detector URL validation failed: {:?}", e);
                    std::process::exit(1);
                }

                #[cfg(target_os = "macos")]
                unsafe {
                    use core_foundation::runloop::{CFRunLoopGetMain, CFRunLoopWakeUp};
                    CFRunLoopWakeUp(CFRunLoopGetMain());
                }

                // Registered on the main thread: tao's event loop pumps the
                // Windows messages needed for WM_HOTKEY delivery.
                let (manager, hotkey_id) = match HotkeyHandler::register_hotkey(&config.hotkey.dismiss)
                {
                    Ok(pair) => pair,
                    Err(e) => {
                        error!("Failed to register hotkey: {:?}", e);
                        std::process::exit(1);
                    }
                };
                hotkey_manager = Some(manager);

                let tray_proxy = tray_proxy.clone();
                let menu_ids = tray_manager.menu_ids().clone();

                // Tokio runtime on its own thread; TrayManager and
                // hotkey_manager stay on the main thread.
                std::thread::spawn(move || {
                    let rt = match tokio::runtime::Runtime::new() {
                        Ok(rt) => rt,
                        Err(e) => {
                            error!("Failed to create tokio runtime: {:?}", e);
                            std::process::exit(1);
                        }
                    };

                    rt.block_on(async move {
                        let session_config = config.session.to_session_config();
                        let transport = WebSocketTransport::new(config.detector.url.clone());

                        let settings: Arc<dyn SettingsStore> = Arc::new(ConfigSettingsStore::new(
                            Arc::new(Mutex::new(config)),
                            config_path.clone(),
                        ));
                        let runner = Arc::new(ActionRunner::new(
                            Arc::new(GitCliClient),
                            Arc::new(EnigoInjector),
                            Arc::new(ShellExecutor::new(Arc::clone(&settings))),
                            Arc::clone(&settings),
                        ));

                        let deps = SessionDeps {
                            commands: Arc::new(transport.clone()),
                            camera: Arc::new(CameraSession::default()),
                            settings,
                            runner,
                        };
                        let (coordinator, session) = SessionCoordinator::new(session_config, deps);

                        let bridge = forward_transport_events(&transport, session.inputs());
                        let coordinator_task = tokio::spawn(coordinator.run());
                        transport.connect().await;

                        let (command_tx, command_rx) = mpsc::channel(32);
                        let (shutdown_tx, shutdown_rx) = watch::channel(false);
                        let hotkey_handler = HotkeyHandler::new(hotkey_id, command_tx.clone());

                        let app = App {
                            transport,
                            session,
                            notifier: Notifier,
                            tray_proxy,
                            config_path,
                            command_tx,
                            command_rx,
                            shutdown_tx,
                            menu_ids,
                        };

                        tokio::join!(
                            async {
                                if let Err(e) = hotkey_handler.run(shutdown_rx).await {
                                    error!(error = ?e, "Hotkey handler error");
                                }
                            },
                            async {
                                if let Err(e) = app.run().await {
                                    error!(error = ?e, "App error");
                                }
                            }
                        );

                        if let Err(e) = coordinator_task.await {
                            error!(error = ?e, "Session coordinator task failed");
                        }
                        bridge.abort();
                    });
                });
            }
            _ => {}
        }

        // Keep hotkey_manager alive in the closure for the app's lifetime.
        let _ = &hotkey_manager;
    });
}
