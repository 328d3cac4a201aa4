//! Title text for the tray icon.
//!
//! - Focus running: "🍅 MM:SS"
//! - Break running: "☕ MM:SS"
//! - Paused: "⏸ 一時停止"
//! - Idle: "⏹ 停止中"

use crate::types::{format_countdown, Phase, SessionState};

const FOCUS_EMOJI: &str = "🍅";
const BREAK_EMOJI: &str = "☕";
const PAUSED_EMOJI: &str = "⏸";
const STOPPED_EMOJI: &str = "⏹";

/// Generates tray titles from the session state.
///
/// Remembers the last title so callers can skip redundant updates.
#[derive(Debug, Default)]
pub struct IconManager {
    last_title: Option<String>,
}

impl IconManager {
    pub fn new() -> Self {
        Self { last_title: None }
    }

    /// Generates the tray title for a session state.
    pub fn generate_title(&self, state: &SessionState) -> String {
        if !state.running {
            return format!("{} 停止中", STOPPED_EMOJI);
        }
        if state.paused {
            return format!("{} 一時停止", PAUSED_EMOJI);
        }
        format!(
            "{} {}",
            Self::emoji_for(state.phase),
            format_countdown(state.remaining_seconds)
        )
    }

    /// Returns the emoji for a phase.
    pub fn emoji_for(phase: Phase) -> &'static str {
        match phase {
            Phase::Focus => FOCUS_EMOJI,
            Phase::Break => BREAK_EMOJI,
        }
    }

    /// Returns the new title if it differs from the last one returned.
    pub fn title_if_changed(&mut self, state: &SessionState) -> Option<String> {
        let title = self.generate_title(state);
        if self.last_title.as_deref() == Some(title.as_str()) {
            return None;
        }
        self.last_title = Some(title.clone());
        Some(title)
    }

    /// Forgets the last title (a new tray icon starts blank).
    pub fn forget(&mut self) {
        self.last_title = None;
    }
}
