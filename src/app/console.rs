//! Terminal rendering of the main window.

use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::types::{ControlState, DisplayUpdate, Durations};
use crate::visibility::{Window, WindowError};

/// What the window currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleState {
    pub visible: bool,
    pub countdown: String,
    pub controls: ControlState,
    pub durations: Option<Durations>,
    pub popup: Option<String>,
}

impl Default for ConsoleState {
    fn default() -> Self {
        Self {
            visible: true,
            countdown: String::new(),
            controls: ControlState::idle(),
            durations: None,
            popup: None,
        }
    }
}

/// The main window, drawn on a terminal.
///
/// While hidden, countdown updates are recorded but not printed.
pub struct ConsoleWindow {
    state: Mutex<ConsoleState>,
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleWindow {
    /// Window writing to stdout.
    pub fn stdout() -> Self {
        Self::with_writer(Box::new(io::stdout()))
    }

    pub fn with_writer(out: Box<dyn Write + Send>) -> Self {
        Self {
            state: Mutex::new(ConsoleState::default()),
            out: Mutex::new(out),
        }
    }

    fn state(&self) -> MutexGuard<'_, ConsoleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a copy of what the window shows.
    pub fn snapshot(&self) -> ConsoleState {
        self.state().clone()
    }

    fn write(&self, text: &str) -> io::Result<()> {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        out.write_all(text.as_bytes())?;
        out.flush()
    }

    fn emit(&self, text: &str) {
        if let Err(e) = self.write(text) {
            tracing::debug!(error = %e, "画面に書き込めませんでした");
        }
    }

    /// Prints a message line regardless of visibility.
    pub fn message(&self, text: &str) {
        self.emit(&format!("\n{text}\n"));
    }

    /// Applies a display update.
    pub fn render(&self, update: DisplayUpdate) {
        let mut state = self.state();
        let text = match update {
            DisplayUpdate::CountdownText(text) => {
                let line = format!("\r⏱ {}  [{}]   ", text, control_hint(&state.controls));
                state.countdown = text;
                line
            }
            DisplayUpdate::Controls(controls) => {
                let line = format!(
                    "\r⏱ {}  [{}]   ",
                    state.countdown,
                    control_hint(&controls)
                );
                state.controls = controls;
                line
            }
            DisplayUpdate::PhaseCompletePopup {
                message,
                auto_dismiss_secs,
            } => {
                let line = format!(
                    "\n🔔 {}（ok で閉じる / {}秒後に自動で閉じます）\n",
                    message, auto_dismiss_secs
                );
                state.popup = Some(message);
                line
            }
            DisplayUpdate::DurationFields(durations) => {
                state.durations = Some(durations);
                format!(
                    "\n作業時間: {}分 / 休憩時間: {}分\n",
                    durations.focus_minutes, durations.break_minutes
                )
            }
        };

        let visible = state.visible;
        drop(state);
        if visible {
            self.emit(&text);
        }
    }

    /// Closes the completion popup. Returns false if none was open.
    pub fn dismiss_popup(&self) -> bool {
        self.state().popup.take().is_some()
    }
}

fn control_hint(controls: &ControlState) -> String {
    let mut hints = Vec::new();
    if controls.start_enabled {
        hints.push("start");
    }
    if controls.pause_enabled {
        hints.push(if controls.pause_label == ControlState::paused().pause_label {
            "resume"
        } else {
            "pause"
        });
    }
    hints.push("reset");
    hints.join(" / ")
}

impl Window for ConsoleWindow {
    fn hide(&self) -> Result<(), WindowError> {
        self.state().visible = false;
        self.write("\n(トレイに格納しました。show で復元します)\n")
            .map_err(|e| WindowError::Hide(e.to_string()))
    }

    fn restore(&self) -> Result<(), WindowError> {
        let (countdown, controls) = {
            let mut state = self.state();
            state.visible = true;
            (state.countdown.clone(), state.controls.clone())
        };
        self.write(&format!(
            "\n── ポモドーロタイマー ──\n⏱ {}  [{}]   ",
            countdown,
            control_hint(&controls)
        ))
        .map_err(|e| WindowError::Restore(e.to_string()))
    }

    fn is_visible(&self) -> bool {
        self.state().visible
    }
}

impl std::fmt::Debug for ConsoleWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleWindow")
            .field("state", &self.snapshot())
            .finish_non_exhaustive()
    }
}
