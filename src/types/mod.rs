//! Core data types for the Pomodoro Timer.
//!
//! This module defines the data structures used for:
//! - Session state (phase, countdown, running/paused flags)
//! - Focus/break durations with validation
//! - Window/tray visibility snapshots
//! - Messages carried by the UI event queue

mod error;

pub use error::DurationError;

use serde::{Deserialize, Serialize};

// ============================================================================
// Phase
// ============================================================================

/// The interval of the Pomodoro cycle the session is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Work interval
    #[default]
    Focus,
    /// Rest interval
    Break,
}

impl Phase {
    /// Returns the string representation of the phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Focus => "focus",
            Phase::Break => "break",
        }
    }

    /// Returns the phase entered when this one completes.
    pub fn next(&self) -> Phase {
        match self {
            Phase::Focus => Phase::Break,
            Phase::Break => Phase::Focus,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Durations
// ============================================================================

/// Focus and break lengths in minutes.
///
/// Both values are strictly positive and small enough that the length in
/// seconds fits a `u32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Durations {
    /// Focus interval length in minutes
    pub focus_minutes: u32,
    /// Break interval length in minutes
    pub break_minutes: u32,
}

impl Default for Durations {
    fn default() -> Self {
        Self {
            focus_minutes: 25,
            break_minutes: 5,
        }
    }
}

impl Durations {
    /// Field name used for the focus length in errors and persisted settings.
    pub const FOCUS_FIELD: &'static str = "focus_time";
    /// Field name used for the break length in errors and persisted settings.
    pub const BREAK_FIELD: &'static str = "break_time";

    /// Creates validated durations.
    ///
    /// # Errors
    ///
    /// Returns an error if either value is zero or too large to count down.
    pub fn new(focus_minutes: u32, break_minutes: u32) -> Result<Self, DurationError> {
        check_minutes(Self::FOCUS_FIELD, focus_minutes)?;
        check_minutes(Self::BREAK_FIELD, break_minutes)?;
        Ok(Self {
            focus_minutes,
            break_minutes,
        })
    }

    /// Parses durations from raw text input (e.g. settings fields).
    ///
    /// # Errors
    ///
    /// Returns an error for non-numeric, non-positive or oversized input.
    /// Nothing is applied unless both values are valid.
    pub fn parse(focus: &str, break_: &str) -> Result<Self, DurationError> {
        let focus_minutes = parse_minutes(Self::FOCUS_FIELD, focus)?;
        let break_minutes = parse_minutes(Self::BREAK_FIELD, break_)?;
        Self::new(focus_minutes, break_minutes)
    }

    /// Returns the configured minutes for the given phase.
    pub fn minutes_for(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Focus => self.focus_minutes,
            Phase::Break => self.break_minutes,
        }
    }

    /// Returns the configured length of the given phase in seconds.
    pub fn seconds_for(&self, phase: Phase) -> u32 {
        self.minutes_for(phase).saturating_mul(60)
    }
}

fn check_minutes(field: &'static str, minutes: u32) -> Result<(), DurationError> {
    if minutes == 0 {
        return Err(DurationError::NotPositive {
            field,
            value: minutes.to_string(),
        });
    }
    if minutes.checked_mul(60).is_none() {
        return Err(DurationError::TooLarge {
            field,
            value: minutes.to_string(),
        });
    }
    Ok(())
}

fn parse_minutes(field: &'static str, raw: &str) -> Result<u32, DurationError> {
    let trimmed = raw.trim();
    match trimmed.parse::<i64>() {
        Ok(value) if value <= 0 => Err(DurationError::NotPositive {
            field,
            value: trimmed.to_string(),
        }),
        Ok(value) => u32::try_from(value).map_err(|_| DurationError::TooLarge {
            field,
            value: trimmed.to_string(),
        }),
        // Digits that overflow i64 are still numbers, just absurd ones.
        Err(_) if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) => {
            Err(DurationError::TooLarge {
                field,
                value: trimmed.to_string(),
            })
        }
        Err(_) => Err(DurationError::NotANumber {
            field,
            value: trimmed.to_string(),
        }),
    }
}

// ============================================================================
// SessionState
// ============================================================================

/// Countdown state owned by the session engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Current phase of the cycle
    pub phase: Phase,
    /// Seconds left in the current phase
    pub remaining_seconds: u32,
    /// Whether a countdown loop is active
    pub running: bool,
    /// Whether the active countdown is paused (only meaningful while running)
    pub paused: bool,
}

impl SessionState {
    /// Creates an idle state for the given phase.
    pub fn new(phase: Phase, remaining_seconds: u32) -> Self {
        Self {
            phase,
            remaining_seconds,
            running: false,
            paused: false,
        }
    }

    /// Returns true if the countdown is advancing (running and not paused).
    pub fn is_ticking(&self) -> bool {
        self.running && !self.paused
    }

    /// Returns the remaining time as `MM:SS`.
    pub fn display_text(&self) -> String {
        format_countdown(self.remaining_seconds)
    }
}

/// Formats seconds as zero-padded `MM:SS`.
///
/// Minutes are floor-divided and not wrapped, so 100 minutes renders as
/// `100:00`.
pub fn format_countdown(remaining_seconds: u32) -> String {
    let minutes = remaining_seconds / 60;
    let seconds = remaining_seconds % 60;
    format!("{:02}:{:02}", minutes, seconds)
}

// ============================================================================
// VisibilityState
// ============================================================================

/// Snapshot of window/tray visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VisibilityState {
    /// Whether the window is hidden in the tray
    pub is_minimized: bool,
    /// Whether a tray icon currently exists
    pub tray_icon_active: bool,
    /// Whether a minimize transition is in progress
    pub minimize_in_flight: bool,
}

// ============================================================================
// ControlState
// ============================================================================

/// Enabled state of the start/pause controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlState {
    /// Whether the start control accepts input
    pub start_enabled: bool,
    /// Whether the pause control accepts input
    pub pause_enabled: bool,
    /// Label shown on the pause control
    pub pause_label: String,
}

impl ControlState {
    /// Controls for a stopped engine.
    pub fn idle() -> Self {
        Self {
            start_enabled: true,
            pause_enabled: false,
            pause_label: "一時停止".to_string(),
        }
    }

    /// Controls for a running engine.
    pub fn running() -> Self {
        Self {
            start_enabled: false,
            pause_enabled: true,
            pause_label: "一時停止".to_string(),
        }
    }

    /// Controls for a paused engine.
    pub fn paused() -> Self {
        Self {
            start_enabled: false,
            pause_enabled: true,
            pause_label: "再開".to_string(),
        }
    }

    /// Derives the controls from a session state.
    pub fn for_state(state: &SessionState) -> Self {
        match (state.running, state.paused) {
            (false, _) => Self::idle(),
            (true, false) => Self::running(),
            (true, true) => Self::paused(),
        }
    }
}

// ============================================================================
// UI Events
// ============================================================================

/// A rendering instruction for the window, applied on the UI thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayUpdate {
    /// Replace the countdown text
    CountdownText(String),
    /// Show the phase-complete popup
    PhaseCompletePopup {
        /// Popup message
        message: String,
        /// Seconds until the popup closes by itself
        auto_dismiss_secs: u64,
    },
    /// Update start/pause controls
    Controls(ControlState),
    /// Re-display the duration fields
    DurationFields(Durations),
}

/// Events consumed by the UI thread.
///
/// Every thread (countdown, tray, unlock monitor, stdin, signals) talks to
/// the UI exclusively through this queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// Start the countdown
    Start,
    /// Pause or resume the countdown
    TogglePause,
    /// Stop and reload the current phase
    Reset,
    /// Apply edited durations (raw field text)
    ApplyDurations {
        /// Focus field text
        focus: String,
        /// Break field text
        break_: String,
    },
    /// Persist the auto-start flag
    SetAutoStart(bool),
    /// Hide the window into the tray
    Minimize,
    /// "Show" chosen from the tray menu
    TrayShow,
    /// Deferred window restoration
    RestoreWindow,
    /// A tray icon loop died
    TrayFailed {
        /// Id of the failed tray icon
        id: u64,
        /// Failure description
        reason: String,
    },
    /// The user session was unlocked
    Unlocked,
    /// Close the completion popup
    DismissPopup,
    /// Print current status
    Status,
    /// Print command help
    Help,
    /// Unparseable user input
    InputError(String),
    /// Render a display update
    Render(DisplayUpdate),
    /// Shut the application down
    Quit,
}

// ============================================================================
// Tests
// ============================================================================
