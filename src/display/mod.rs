//! Display sink for the session engine.
//!
//! The engine publishes countdown text, popups and control states through
//! the [`Display`] trait without knowing how they are rendered. The
//! production implementation, [`UiDisplay`], never renders anything itself:
//! it queues a [`DisplayUpdate`] onto the UI event channel so that the
//! actual window mutation happens on the UI thread, no matter which thread
//! (usually the countdown thread) produced the update.

use std::sync::{Mutex, PoisonError};

use crossbeam_channel::Sender;

use crate::types::{ControlState, DisplayUpdate, Durations, UiEvent};

pub use crate::types::format_countdown;

/// Passive rendering sink.
pub trait Display: Send + Sync {
    /// Replaces the countdown text (`MM:SS`).
    fn set_countdown_text(&self, text: &str);

    /// Shows the phase-complete popup, closing itself after the timeout.
    fn show_phase_complete_popup(&self, message: &str, auto_dismiss_secs: u64);

    /// Updates the start/pause controls.
    fn set_controls_enabled(&self, controls: ControlState);

    /// Re-displays the duration fields with the given values.
    fn set_duration_fields(&self, durations: Durations);
}

// ============================================================================
// UiDisplay
// ============================================================================

/// Display that marshals every update onto the UI thread's queue.
#[derive(Debug, Clone)]
pub struct UiDisplay {
    tx: Sender<UiEvent>,
}

impl UiDisplay {
    /// Creates a display feeding the given UI queue.
    pub fn new(tx: Sender<UiEvent>) -> Self {
        Self { tx }
    }

    fn post(&self, update: DisplayUpdate) {
        if self.tx.send(UiEvent::Render(update)).is_err() {
            tracing::debug!("UIキューが閉じているため表示更新を破棄しました");
        }
    }
}

impl Display for UiDisplay {
    fn set_countdown_text(&self, text: &str) {
        self.post(DisplayUpdate::CountdownText(text.to_string()));
    }

    fn show_phase_complete_popup(&self, message: &str, auto_dismiss_secs: u64) {
        self.post(DisplayUpdate::PhaseCompletePopup {
            message: message.to_string(),
            auto_dismiss_secs,
        });
    }

    fn set_controls_enabled(&self, controls: ControlState) {
        self.post(DisplayUpdate::Controls(controls));
    }

    fn set_duration_fields(&self, durations: Durations) {
        self.post(DisplayUpdate::DurationFields(durations));
    }
}

// ============================================================================
// RecordingDisplay
// ============================================================================

/// Display that records every update, for tests.
#[derive(Debug, Default)]
pub struct RecordingDisplay {
    updates: Mutex<Vec<DisplayUpdate>>,
}

impl RecordingDisplay {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all recorded updates in order.
    #[must_use]
    pub fn updates(&self) -> Vec<DisplayUpdate> {
        self.lock().clone()
    }

    /// Returns the recorded countdown texts in order.
    #[must_use]
    pub fn countdown_texts(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|update| match update {
                DisplayUpdate::CountdownText(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Returns the recorded popup messages in order.
    #[must_use]
    pub fn popups(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|update| match update {
                DisplayUpdate::PhaseCompletePopup { message, .. } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    /// Returns the most recent control state, if any.
    #[must_use]
    pub fn last_controls(&self) -> Option<ControlState> {
        self.lock().iter().rev().find_map(|update| match update {
            DisplayUpdate::Controls(controls) => Some(controls.clone()),
            _ => None,
        })
    }

    /// Returns the most recent duration field values, if any.
    #[must_use]
    pub fn last_duration_fields(&self) -> Option<Durations> {
        self.lock().iter().rev().find_map(|update| match update {
            DisplayUpdate::DurationFields(durations) => Some(*durations),
            _ => None,
        })
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<DisplayUpdate>> {
        self.updates.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, update: DisplayUpdate) {
        self.lock().push(update);
    }
}

impl Display for RecordingDisplay {
    fn set_countdown_text(&self, text: &str) {
        self.record(DisplayUpdate::CountdownText(text.to_string()));
    }

    fn show_phase_complete_popup(&self, message: &str, auto_dismiss_secs: u64) {
        self.record(DisplayUpdate::PhaseCompletePopup {
            message: message.to_string(),
            auto_dismiss_secs,
        });
    }

    fn set_controls_enabled(&self, controls: ControlState) {
        self.record(DisplayUpdate::Controls(controls));
    }

    fn set_duration_fields(&self, durations: Durations) {
        self.record(DisplayUpdate::DurationFields(durations));
    }
}

// ============================================================================
// Tests
// ============================================================================
