//! System tray icon with state-based updates.
//!
//! The icon is a filled circle whose colour follows [`TrayIconState`]; the
//! context menu offers Dismiss, Calibrate Snap, Open Last Commit, Settings
//! and Exit.

use crate::{AppError, AppResult, TrayIconState};

use std::panic::Location;

use error_location::ErrorLocation;
use image::{Rgba, RgbaImage};
use tracing::{info, instrument};
use tray_icon::menu::{Menu, MenuId, MenuItem, PredefinedMenuItem};
use tray_icon::{Icon, TrayIcon, TrayIconBuilder};

const ICON_SIZE: u32 = 32;

/// Menu item identifiers, cloned to the async runtime for event matching.
#[derive(Debug, Clone)]
pub struct TrayMenuIds {
    /// Dismiss the current session.
    pub dismiss: MenuId,
    /// Recalibrate snap detection.
    pub calibrate_snap: MenuId,
    /// Open the last commit URL.
    pub open_last_commit: MenuId,
    /// Open the config file.
    pub settings: MenuId,
    /// Quit.
    pub exit: MenuId,
}

/// System tray icon manager.
pub struct TrayManager {
    tray_icon: TrayIcon,
    menu_ids: TrayMenuIds,
}

#[track_caller]
fn tray_error(what: &str, e: impl std::fmt::Display) -> AppError {
    AppError::TrayError {
        reason: format!("{}: {}", what, e),
        location: ErrorLocation::from(Location::caller()),
    }
}

impl TrayManager {
    /// Create a new tray manager in the offline state.
    #[track_caller]
    #[instrument]
    pub fn new() -> AppResult<Self> {
        let menu = Menu::new();

        let dismiss = MenuItem::new("Dismiss", true, None);
        let calibrate_snap = MenuItem::new("Calibrate Snap", true, None);
        let open_last_commit = MenuItem::new("Open Last Commit", true, None);
        let settings = MenuItem::new("Settings", true, None);
        let exit = MenuItem::new("Exit", true, None);
        let separator = PredefinedMenuItem::separator();

        menu.append_items(&[
            &dismiss,
            &calibrate_snap,
            &open_last_commit,
            &separator,
            &settings,
            &exit,
        ])
        .map_err(|e| tray_error("Failed to build tray menu", e))?;

        let menu_ids = TrayMenuIds {
            dismiss: dismiss.id().clone(),
            calibrate_snap: calibrate_snap.id().clone(),
            open_last_commit: open_last_commit.id().clone(),
            settings: settings.id().clone(),
            exit: exit.id().clone(),
        };

        let initial = TrayIconState::Offline;
        let tray_icon = TrayIconBuilder::new()
            .with_tooltip(initial.tooltip())
            .with_menu(Box::new(menu))
            .with_icon(Self::render_icon(initial)?)
            .build()
            .map_err(|e| tray_error("Failed to create tray icon", e))?;

        info!("System tray icon initialized");

        Ok(Self {
            tray_icon,
            menu_ids,
        })
    }

    /// Update the tray icon state with new icon and tooltip.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn update_state(&mut self, state: TrayIconState) -> AppResult<()> {
        self.tray_icon
            .set_icon(Some(Self::render_icon(state)?))
            .map_err(|e| tray_error("Failed to update icon", e))?;

        self.tray_icon
            .set_tooltip(Some(state.tooltip()))
            .map_err(|e| tray_error("Failed to update tooltip", e))?;

        Ok(())
    }

    /// Menu item identifiers.
    pub fn menu_ids(&self) -> &TrayMenuIds {
        &self.menu_ids
    }

    #[track_caller]
    fn render_icon(state: TrayIconState) -> AppResult<Icon> {
        let rgba = icon_pixels(state);
        let (width, height) = (rgba.width(), rgba.height());

        Icon::from_rgba(rgba.into_raw(), width, height)
            .map_err(|e| tray_error("Failed to create icon from RGBA", e))
    }
}

/// Filled circle in the state's colour on a transparent background.
pub(crate) fn icon_pixels(state: TrayIconState) -> RgbaImage {
    let fill = Rgba(state.color());
    let centre = (ICON_SIZE as f32 - 1.0) / 2.0;
    let radius = ICON_SIZE as f32 / 2.0 - 1.0;

    RgbaImage::from_fn(ICON_SIZE, ICON_SIZE, |x, y| {
        let dx = x as f32 - centre;
        let dy = y as f32 - centre;
        if dx * dx + dy * dy <= radius * radius {
            fill
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}
