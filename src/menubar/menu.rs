//! Tray menu configuration.
//!
//! The configuration is platform-independent; the tray thread reports it
//! item by item.

use super::event::{MenuAction, MenuItemId};
use crate::types::{format_countdown, SessionState};

/// Tooltip shown when hovering the tray icon.
pub const TRAY_TOOLTIP: &str = "ポモドーロタイマー";

// ============================================================================
// MenuItemConfig
// ============================================================================

/// Configuration for a menu item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItemConfig {
    /// Which item this is
    pub id: MenuItemId,
    /// Display text for the menu item
    pub text: String,
    /// Whether the menu item is enabled (clickable)
    pub enabled: bool,
}

impl MenuItemConfig {
    pub fn new(id: MenuItemId, text: impl Into<String>, enabled: bool) -> Self {
        Self {
            id,
            text: text.into(),
            enabled,
        }
    }

    fn action(action: MenuAction, id: MenuItemId) -> Self {
        Self::new(id, action.label(), true)
    }
}

// ============================================================================
// MenuConfig
// ============================================================================

/// Complete tray menu: a status line followed by Show and Exit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuConfig {
    /// Tooltip text
    pub tooltip: String,
    /// Status line (always disabled)
    pub status: MenuItemConfig,
    /// Show button
    pub show: MenuItemConfig,
    /// Exit button
    pub exit: MenuItemConfig,
}

impl MenuConfig {
    /// Returns the items in display order.
    pub fn items(&self) -> [&MenuItemConfig; 3] {
        [&self.status, &self.show, &self.exit]
    }
}

// ============================================================================
// MenuBuilder
// ============================================================================

/// Builds the tray menu for a session state.
#[derive(Debug, Default)]
pub struct MenuBuilder;

impl MenuBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(&self, state: &SessionState) -> MenuConfig {
        MenuConfig {
            tooltip: TRAY_TOOLTIP.to_string(),
            status: MenuItemConfig::new(MenuItemId::Status, Self::status_text(state), false),
            show: MenuItemConfig::action(MenuAction::Show, MenuItemId::Show),
            exit: MenuItemConfig::action(MenuAction::Exit, MenuItemId::Exit),
        }
    }

    fn status_text(state: &SessionState) -> String {
        if !state.running {
            return "停止中".to_string();
        }
        let phase_text = match state.phase {
            crate::types::Phase::Focus => "作業中",
            crate::types::Phase::Break => "休憩中",
        };
        if state.paused {
            format!("{}（一時停止）: {}", phase_text, format_countdown(state.remaining_seconds))
        } else {
            format!("{}: 残り {}", phase_text, format_countdown(state.remaining_seconds))
        }
    }
}
