//! Event handling for tray menu interactions.
//!
//! A tray menu click is translated into a [`UiEvent`] and posted to the UI
//! queue; the tray thread itself never touches the window or the engine.

use std::fmt;

use crossbeam_channel::Sender;

use crate::types::UiEvent;

// ============================================================================
// MenuAction
// ============================================================================

/// Actions that can be triggered from the tray menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    /// Bring the window back and remove the tray icon
    Show,
    /// Quit the application
    Exit,
}

impl fmt::Display for MenuAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl MenuAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            MenuAction::Show => "show",
            MenuAction::Exit => "exit",
        }
    }

    /// Returns the menu label for this action.
    pub fn label(&self) -> &'static str {
        match self {
            MenuAction::Show => "表示",
            MenuAction::Exit => "終了",
        }
    }

    /// Returns the UI event this action posts.
    pub fn to_ui_event(self) -> UiEvent {
        match self {
            MenuAction::Show => UiEvent::TrayShow,
            MenuAction::Exit => UiEvent::Quit,
        }
    }
}

// ============================================================================
// MenuItemId
// ============================================================================

/// Identifiers for tray menu items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuItemId {
    /// Remaining-time status line (disabled)
    Status,
    /// Show menu item
    Show,
    /// Exit menu item
    Exit,
}

impl MenuItemId {
    /// Converts a menu item ID to the corresponding action.
    pub fn to_action(&self) -> Option<MenuAction> {
        match self {
            MenuItemId::Show => Some(MenuAction::Show),
            MenuItemId::Exit => Some(MenuAction::Exit),
            MenuItemId::Status => None,
        }
    }
}

// ============================================================================
// EventHandler
// ============================================================================

/// Converts menu clicks into UI events.
#[derive(Debug, Default)]
pub struct EventHandler;

impl EventHandler {
    pub fn new() -> Self {
        Self
    }

    /// Returns the action for a clicked item, if any.
    pub fn handle_click(&self, item_id: MenuItemId) -> Option<MenuAction> {
        let action = item_id.to_action();

        if let Some(ref action) = action {
            tracing::info!(action = %action, "トレイメニューからアクションを受信");
        }

        action
    }

    /// Handles a click and posts the resulting event to the UI queue.
    ///
    /// Returns `true` if an event was posted.
    pub fn dispatch(&self, item_id: MenuItemId, events: &Sender<UiEvent>) -> bool {
        let Some(action) = self.handle_click(item_id) else {
            return false;
        };

        match events.send(action.to_ui_event()) {
            Ok(()) => true,
            Err(_) => {
                tracing::warn!(
                    action = %action,
                    "UIキューが閉じているためメニュー操作を破棄しました"
                );
                false
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
