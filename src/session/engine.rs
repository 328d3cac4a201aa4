//! Session engine for the Pomodoro Timer.
//!
//! This module provides the countdown state machine:
//! - Idle → Running via `start()`, Running ⇄ Paused via the pause toggle,
//!   Running/Paused → Idle via `reset()` or `stop()`
//! - One countdown thread per run, ticking once per tick interval
//! - Completion side effects (notify → popup → phase flip → restart)
//!
//! Completion is not a resting state: when a phase reaches zero the engine
//! flips to the other phase and immediately starts a new run, alternating
//! focus and break until it is reset or stopped.
//!
//! Every `start()` bumps a run generation. A countdown thread only touches
//! the state while its generation is current, so a `reset()` followed by a
//! quick `start()` can never leave two loops decrementing the same counter.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use super::messages::{completion_alert, completion_popup, POPUP_AUTO_DISMISS_SECS};
use crate::config::ConfigStore;
use crate::display::Display;
use crate::notification::NotificationPort;
use crate::types::{ControlState, DurationError, Durations, Phase, SessionState};

/// Length of one countdown tick.
pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

// ============================================================================
// Internal state
// ============================================================================

#[derive(Debug)]
struct RunState {
    session: SessionState,
    /// Incremented on every launch; identifies the live countdown thread.
    generation: u64,
}

enum TickCheck {
    Exit,
    Expired,
    Active { paused: bool },
}

enum TickOutcome {
    Continue,
    Expired,
}

struct Shared {
    run: Mutex<RunState>,
    config: Arc<ConfigStore>,
    display: Arc<dyn Display>,
    notifier: Arc<dyn NotificationPort>,
    tick: Duration,
}

impl Shared {
    fn lock_run(&self) -> MutexGuard<'_, RunState> {
        self.run.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Marks the session running and spawns a countdown thread for it.
    fn launch(self: &Arc<Self>, run: &mut RunState) {
        run.session.running = true;
        run.session.paused = false;
        run.generation += 1;
        let generation = run.generation;

        let worker = Arc::clone(self);
        let spawned = thread::Builder::new()
            .name(format!("countdown-{generation}"))
            .spawn(move || worker.countdown_loop(generation));

        match spawned {
            Ok(_) => {
                self.display.set_controls_enabled(ControlState::running());
                info!(
                    phase = %run.session.phase,
                    remaining_seconds = run.session.remaining_seconds,
                    generation,
                    "カウントダウンを開始しました"
                );
            }
            Err(e) => {
                error!(error = %e, "カウントダウンスレッドを起動できませんでした");
                run.session.running = false;
                self.display.set_controls_enabled(ControlState::idle());
            }
        }
    }

    fn countdown_loop(self: Arc<Self>, generation: u64) {
        debug!(generation, "カウントダウンスレッド開始");

        loop {
            let paused = match self.check(generation) {
                TickCheck::Exit => break,
                TickCheck::Expired => {
                    self.complete_phase(generation);
                    break;
                }
                TickCheck::Active { paused } => paused,
            };

            thread::sleep(self.tick);

            if paused {
                continue;
            }

            if let TickOutcome::Expired = self.advance(generation) {
                self.complete_phase(generation);
                break;
            }
        }

        debug!(generation, "カウントダウンスレッド終了");
    }

    fn check(&self, generation: u64) -> TickCheck {
        let run = self.lock_run();
        if run.generation != generation || !run.session.running {
            TickCheck::Exit
        } else if run.session.remaining_seconds == 0 {
            TickCheck::Expired
        } else {
            TickCheck::Active {
                paused: run.session.paused,
            }
        }
    }

    /// Applies one tick. Pause, reset or a newer run that landed during the
    /// sleep are honoured here, before anything is decremented.
    fn advance(&self, generation: u64) -> TickOutcome {
        let mut run = self.lock_run();
        if run.generation != generation
            || !run.session.is_ticking()
            || run.session.remaining_seconds == 0
        {
            return TickOutcome::Continue;
        }

        run.session.remaining_seconds -= 1;
        self.display
            .set_countdown_text(&run.session.display_text());

        if run.session.remaining_seconds == 0 {
            TickOutcome::Expired
        } else {
            TickOutcome::Continue
        }
    }

    fn complete_phase(self: &Arc<Self>, generation: u64) {
        let finished = {
            let run = self.lock_run();
            if run.generation != generation || !run.session.running {
                return;
            }
            run.session.phase
        };

        // Read at phase entry so edits made during the elapsed phase apply now.
        let durations = self.config.durations();
        info!(phase = %finished, "フェーズが完了しました");

        let alert = completion_alert(finished, &durations);
        self.notifier.notify(&alert.title, &alert.message);
        self.display.show_phase_complete_popup(
            &completion_popup(finished, &durations),
            POPUP_AUTO_DISMISS_SECS,
        );

        let mut run = self.lock_run();
        if run.generation != generation || !run.session.running {
            info!("完了処理中に停止されたため次のフェーズは開始しません");
            return;
        }

        let next = finished.next();
        run.session.phase = next;
        run.session.remaining_seconds = durations.seconds_for(next);
        self.display
            .set_countdown_text(&run.session.display_text());
        self.launch(&mut run);
    }
}

// ============================================================================
// SessionEngine
// ============================================================================

/// Handle to the session state machine.
///
/// Cloning is cheap; all clones drive the same session.
#[derive(Clone)]
pub struct SessionEngine {
    shared: Arc<Shared>,
}

impl SessionEngine {
    /// Creates an idle engine in the focus phase with one-second ticks.
    pub fn new(
        config: Arc<ConfigStore>,
        display: Arc<dyn Display>,
        notifier: Arc<dyn NotificationPort>,
    ) -> Self {
        Self::with_tick(config, display, notifier, DEFAULT_TICK)
    }

    /// Creates an idle engine with a custom tick length.
    pub fn with_tick(
        config: Arc<ConfigStore>,
        display: Arc<dyn Display>,
        notifier: Arc<dyn NotificationPort>,
        tick: Duration,
    ) -> Self {
        let durations = config.durations();
        let session = SessionState::new(Phase::Focus, durations.seconds_for(Phase::Focus));

        display.set_countdown_text(&session.display_text());
        display.set_controls_enabled(ControlState::idle());
        display.set_duration_fields(durations);

        Self {
            shared: Arc::new(Shared {
                run: Mutex::new(RunState {
                    session,
                    generation: 0,
                }),
                config,
                display,
                notifier,
                tick,
            }),
        }
    }

    /// Starts the countdown. Does nothing if it is already running.
    pub fn start(&self) {
        let mut run = self.shared.lock_run();
        if run.session.running {
            debug!("タイマーは既に実行中です");
            return;
        }
        self.shared.launch(&mut run);
    }

    /// Flips the paused flag and returns the new value.
    ///
    /// Has no effect while the engine is idle.
    pub fn toggle_pause(&self) -> bool {
        self.update_paused(|paused| !paused)
    }

    /// Pauses a running countdown.
    pub fn pause(&self) {
        self.update_paused(|_| true);
    }

    /// Resumes a paused countdown.
    pub fn resume(&self) {
        self.update_paused(|_| false);
    }

    fn update_paused(&self, next: impl FnOnce(bool) -> bool) -> bool {
        let mut run = self.shared.lock_run();
        if !run.session.running {
            debug!("タイマーは実行されていません");
            return false;
        }

        let paused = next(run.session.paused);
        if paused != run.session.paused {
            run.session.paused = paused;
            self.shared
                .display
                .set_controls_enabled(ControlState::for_state(&run.session));
            info!(
                paused,
                remaining_seconds = run.session.remaining_seconds,
                "一時停止状態を切り替えました"
            );
        }
        paused
    }

    /// Stops the countdown and reloads the current phase's full length.
    ///
    /// The phase is kept. A countdown thread that is mid-sleep exits at its
    /// next wake-up without applying the tick.
    pub fn reset(&self) {
        let durations = self.shared.config.durations();
        let mut run = self.shared.lock_run();
        run.session.running = false;
        run.session.paused = false;
        run.session.remaining_seconds = durations.seconds_for(run.session.phase);

        self.shared
            .display
            .set_countdown_text(&run.session.display_text());
        self.shared
            .display
            .set_controls_enabled(ControlState::idle());
        info!(
            phase = %run.session.phase,
            remaining_seconds = run.session.remaining_seconds,
            "タイマーをリセットしました"
        );
    }

    /// Stops the countdown without touching the remaining time.
    pub fn stop(&self) {
        let mut run = self.shared.lock_run();
        if !run.session.running {
            return;
        }
        run.session.running = false;
        run.session.paused = false;
        self.shared
            .display
            .set_controls_enabled(ControlState::idle());
        info!("タイマーを停止しました");
    }

    /// Validates, persists and applies new focus/break lengths.
    ///
    /// On success the engine is reset so the current phase reloads with the
    /// new length. On failure nothing changes and the display is told to
    /// show the last valid values again.
    ///
    /// # Errors
    ///
    /// Returns the validation error for non-numeric or non-positive input.
    pub fn apply_durations(&self, focus: &str, break_: &str) -> Result<Durations, DurationError> {
        let durations = match Durations::parse(focus, break_) {
            Ok(durations) => durations,
            Err(e) => {
                warn!(error = %e, "不正な時間設定を破棄しました");
                self.shared
                    .display
                    .set_duration_fields(self.shared.config.durations());
                return Err(e);
            }
        };

        if let Err(e) = self.shared.config.set_durations(durations) {
            warn!(error = %e, "時間設定を保存できませんでした（このセッションには適用されます）");
        }
        self.shared.display.set_duration_fields(durations);
        self.reset();
        Ok(durations)
    }

    /// Returns a copy of the current session state.
    pub fn snapshot(&self) -> SessionState {
        self.shared.lock_run().session.clone()
    }

    /// Returns the countdown text (`MM:SS`).
    pub fn display_text(&self) -> String {
        self.shared.lock_run().session.display_text()
    }

    /// Returns the control state matching the current session.
    pub fn control_state(&self) -> ControlState {
        ControlState::for_state(&self.shared.lock_run().session)
    }

    #[cfg(test)]
    fn with_session<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        f(&mut self.shared.lock_run().session)
    }

    #[cfg(test)]
    fn generation(&self) -> u64 {
        self.shared.lock_run().generation
    }

    #[cfg(test)]
    fn complete_current_phase(&self) {
        let generation = self.generation();
        self.shared.complete_phase(generation);
    }
}

impl std::fmt::Debug for SessionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionEngine")
            .field("session", &self.snapshot())
            .field("tick", &self.shared.tick)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::display::RecordingDisplay;
    use crate::notification::MockNotifier;
    use std::time::Instant;

    /// Long enough that spawned countdown threads never tick during a test.
    const FROZEN_TICK: Duration = Duration::from_secs(3600);

    struct Fixture {
        engine: SessionEngine,
        config: Arc<ConfigStore>,
        display: Arc<RecordingDisplay>,
        notifier: Arc<MockNotifier>,
    }

    fn fixture(focus: u32, break_: u32, tick: Duration) -> Fixture {
        let config = Arc::new(ConfigStore::in_memory(Settings {
            auto_start: true,
            focus_time: focus,
            break_time: break_,
        }));
        let display = Arc::new(RecordingDisplay::new());
        let notifier = Arc::new(MockNotifier::new());
        let engine = SessionEngine::with_tick(
            Arc::clone(&config),
            display.clone(),
            notifier.clone(),
            tick,
        );
        Fixture {
            engine,
            config,
            display,
            notifier,
        }
    }

    fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        condition()
    }

    fn parse_countdown(text: &str) -> u32 {
        let (minutes, seconds) = text.split_once(':').unwrap();
        minutes.parse::<u32>().unwrap() * 60 + seconds.parse::<u32>().unwrap()
    }

    // ------------------------------------------------------------------------
    // Control Operation Tests
    // ------------------------------------------------------------------------

    mod control_tests {
        use super::*;

        #[test]
        fn test_new_engine_is_idle_focus() {
            let f = fixture(25, 5, FROZEN_TICK);
            let state = f.engine.snapshot();

            assert_eq!(state.phase, Phase::Focus);
            assert_eq!(state.remaining_seconds, 1500);
            assert!(!state.running);
            assert!(!state.paused);
            assert_eq!(f.display.countdown_texts(), vec!["25:00".to_string()]);
            assert_eq!(f.display.last_controls(), Some(ControlState::idle()));
        }

        #[test]
        fn test_start_runs_and_updates_controls() {
            let f = fixture(25, 5, FROZEN_TICK);
            f.engine.start();

            let state = f.engine.snapshot();
            assert!(state.running);
            assert!(!state.paused);
            assert_eq!(f.display.last_controls(), Some(ControlState::running()));
            assert_eq!(f.engine.generation(), 1);
        }

        #[test]
        fn test_start_when_running_is_noop() {
            let f = fixture(25, 5, FROZEN_TICK);
            f.engine.start();
            f.engine.start();
            f.engine.start();

            assert_eq!(f.engine.generation(), 1);
        }

        #[test]
        fn test_toggle_pause_twice_keeps_remaining() {
            let f = fixture(25, 5, FROZEN_TICK);
            f.engine.start();
            f.engine.with_session(|s| s.remaining_seconds = 777);

            assert!(f.engine.toggle_pause());
            assert_eq!(f.display.last_controls(), Some(ControlState::paused()));
            assert!(!f.engine.toggle_pause());

            let state = f.engine.snapshot();
            assert_eq!(state.remaining_seconds, 777);
            assert!(state.running);
            assert!(!state.paused);
            assert_eq!(f.engine.generation(), 1);
        }

        #[test]
        fn test_toggle_pause_when_idle_is_noop() {
            let f = fixture(25, 5, FROZEN_TICK);
            assert!(!f.engine.toggle_pause());
            assert!(!f.engine.snapshot().paused);
        }

        #[test]
        fn test_pause_and_resume_are_directional() {
            let f = fixture(25, 5, FROZEN_TICK);
            f.engine.start();

            f.engine.pause();
            f.engine.pause();
            assert!(f.engine.snapshot().paused);

            f.engine.resume();
            f.engine.resume();
            assert!(!f.engine.snapshot().paused);
        }

        #[test]
        fn test_reset_keeps_phase_and_reloads() {
            let f = fixture(25, 5, FROZEN_TICK);
            f.engine.start();
            f.engine.with_session(|s| {
                s.phase = Phase::Break;
                s.remaining_seconds = 12;
                s.paused = true;
            });

            f.engine.reset();

            let state = f.engine.snapshot();
            assert_eq!(state.phase, Phase::Break);
            assert_eq!(state.remaining_seconds, 300);
            assert!(!state.running);
            assert!(!state.paused);
            assert_eq!(f.display.last_controls(), Some(ControlState::idle()));
            assert_eq!(f.engine.display_text(), "05:00");
        }

        #[test]
        fn test_stop_keeps_remaining() {
            let f = fixture(25, 5, FROZEN_TICK);
            f.engine.start();
            f.engine.with_session(|s| s.remaining_seconds = 42);

            f.engine.stop();

            let state = f.engine.snapshot();
            assert!(!state.running);
            assert_eq!(state.remaining_seconds, 42);
        }
    }

    // ------------------------------------------------------------------------
    // Duration Settings Tests
    // ------------------------------------------------------------------------

    mod apply_durations_tests {
        use super::*;

        #[test]
        fn test_apply_valid_durations_resets_focus() {
            let f = fixture(25, 5, FROZEN_TICK);
            f.engine.start();

            let applied = f.engine.apply_durations("40", "8").unwrap();

            assert_eq!(applied, Durations::new(40, 8).unwrap());
            assert_eq!(f.config.durations(), applied);
            let state = f.engine.snapshot();
            assert_eq!(state.remaining_seconds, 40 * 60);
            assert!(!state.running);
            assert_eq!(f.display.last_duration_fields(), Some(applied));
        }

        #[test]
        fn test_apply_valid_durations_in_break_phase() {
            let f = fixture(25, 5, FROZEN_TICK);
            f.engine.with_session(|s| s.phase = Phase::Break);

            f.engine.apply_durations("40", "8").unwrap();

            assert_eq!(f.engine.snapshot().remaining_seconds, 8 * 60);
        }

        #[test]
        fn test_apply_negative_leaves_everything_untouched() {
            let f = fixture(25, 5, FROZEN_TICK);
            f.engine.start();
            f.engine.with_session(|s| s.remaining_seconds = 1234);

            let result = f.engine.apply_durations("-5", "5");

            assert!(matches!(result, Err(DurationError::NotPositive { .. })));
            assert_eq!(f.config.durations(), Durations::new(25, 5).unwrap());
            let state = f.engine.snapshot();
            assert_eq!(state.remaining_seconds, 1234);
            assert!(state.running);
            assert_eq!(
                f.display.last_duration_fields(),
                Some(Durations::new(25, 5).unwrap())
            );
        }

        #[test]
        fn test_apply_non_numeric_is_rejected() {
            let f = fixture(25, 5, FROZEN_TICK);
            let result = f.engine.apply_durations("25", "five");
            assert!(matches!(result, Err(DurationError::NotANumber { .. })));
            assert_eq!(f.config.durations(), Durations::new(25, 5).unwrap());
        }

        #[test]
        fn test_edits_apply_at_next_phase_entry() {
            let f = fixture(25, 5, FROZEN_TICK);
            f.engine.start();
            f.engine.with_session(|s| s.remaining_seconds = 100);

            // Direct store edit (no reset): the running phase is unaffected.
            f.config
                .set_durations(Durations::new(30, 7).unwrap())
                .unwrap();
            assert_eq!(f.engine.snapshot().remaining_seconds, 100);

            f.engine.with_session(|s| s.remaining_seconds = 0);
            f.engine.complete_current_phase();
            assert_eq!(f.engine.snapshot().remaining_seconds, 7 * 60);
        }
    }

    // ------------------------------------------------------------------------
    // Completion Tests
    // ------------------------------------------------------------------------

    mod completion_tests {
        use super::*;

        #[test]
        fn test_completion_alternates_phases() {
            let f = fixture(25, 5, FROZEN_TICK);
            f.engine.start();
            f.engine.with_session(|s| s.remaining_seconds = 0);

            f.engine.complete_current_phase();

            let state = f.engine.snapshot();
            assert_eq!(state.phase, Phase::Break);
            assert_eq!(state.remaining_seconds, 5 * 60);
            assert!(state.running);
            assert_eq!(f.engine.generation(), 2);
            assert_eq!(f.notifier.notification_count(), 1);
            assert_eq!(f.notifier.get_notifications()[0].0, "休憩時間です！");

            f.engine.with_session(|s| s.remaining_seconds = 0);
            f.engine.complete_current_phase();

            let state = f.engine.snapshot();
            assert_eq!(state.phase, Phase::Focus);
            assert_eq!(state.remaining_seconds, 25 * 60);
            assert!(state.running);
            assert_eq!(f.notifier.notification_count(), 2);
            assert_eq!(f.notifier.get_notifications()[1].0, "作業に戻りましょう！");
        }

        #[test]
        fn test_completion_shows_popup_with_timeout() {
            let f = fixture(25, 5, FROZEN_TICK);
            f.engine.start();
            f.engine.with_session(|s| s.remaining_seconds = 0);
            f.engine.complete_current_phase();

            let popup = f.display.updates().into_iter().find_map(|u| match u {
                crate::types::DisplayUpdate::PhaseCompletePopup {
                    message,
                    auto_dismiss_secs,
                } => Some((message, auto_dismiss_secs)),
                _ => None,
            });
            let (message, secs) = popup.unwrap();
            assert!(message.contains("5分"));
            assert_eq!(secs, POPUP_AUTO_DISMISS_SECS);
        }

        #[test]
        fn test_completion_of_stale_run_is_ignored() {
            let f = fixture(25, 5, FROZEN_TICK);
            f.engine.start();
            let stale = f.engine.generation();
            f.engine.reset();
            f.engine.start();

            f.engine.shared.complete_phase(stale);

            assert_eq!(f.engine.snapshot().phase, Phase::Focus);
            assert_eq!(f.notifier.notification_count(), 0);
        }

        #[test]
        fn test_completion_after_reset_does_not_restart() {
            let f = fixture(25, 5, FROZEN_TICK);
            f.engine.start();
            f.engine.reset();

            f.engine.complete_current_phase();

            let state = f.engine.snapshot();
            assert!(!state.running);
            assert_eq!(state.phase, Phase::Focus);
        }
    }

    // ------------------------------------------------------------------------
    // Countdown Thread Tests
    // ------------------------------------------------------------------------

    mod countdown_tests {
        use super::*;

        #[test]
        fn test_ticks_decrease_by_one() {
            let f = fixture(1, 1, Duration::from_millis(2));
            f.engine.start();

            assert!(wait_until(Duration::from_secs(5), || f
                .display
                .countdown_texts()
                .len()
                >= 11));
            f.engine.reset();

            let texts = f.display.countdown_texts();
            let seconds: Vec<u32> = texts[..11].iter().map(|t| parse_countdown(t)).collect();
            assert_eq!(seconds[0], 60);
            for pair in seconds.windows(2) {
                assert_eq!(pair[0], pair[1] + 1);
            }
        }

        #[test]
        fn test_full_focus_phase_rolls_over_to_break() {
            let f = fixture(1, 1, Duration::from_millis(1));
            f.engine.start();

            assert!(wait_until(Duration::from_secs(10), || f
                .notifier
                .notification_count()
                >= 1));

            let texts = f.display.countdown_texts();
            // Initial "01:00", 60 ticks down to "00:00", then the break reload.
            let expected: Vec<String> = (0..=60)
                .rev()
                .map(crate::types::format_countdown)
                .chain(std::iter::once("01:00".to_string()))
                .collect();
            assert!(texts.len() >= expected.len());
            assert_eq!(texts[..expected.len()], expected[..]);
            assert_eq!(f.notifier.get_notifications()[0].0, "休憩時間です！");

            let state = f.engine.snapshot();
            assert!(state.running);
            f.engine.reset();
        }

        #[test]
        fn test_paused_countdown_does_not_tick() {
            let f = fixture(25, 5, Duration::from_millis(5));
            f.engine.start();
            f.engine.pause();
            let before = f.engine.snapshot().remaining_seconds;

            thread::sleep(Duration::from_millis(60));

            assert_eq!(f.engine.snapshot().remaining_seconds, before);
            f.engine.resume();
            assert!(wait_until(Duration::from_secs(5), || {
                f.engine.snapshot().remaining_seconds < before
            }));
            f.engine.reset();
        }

        #[test]
        fn test_reset_then_start_keeps_single_loop() {
            let f = fixture(25, 5, Duration::from_millis(20));
            f.engine.start();
            thread::sleep(Duration::from_millis(30));
            f.engine.reset();
            f.engine.start();
            let before = f.engine.snapshot().remaining_seconds;

            thread::sleep(Duration::from_millis(500));
            let consumed = before - f.engine.snapshot().remaining_seconds;
            f.engine.reset();

            // One loop can apply at most ~25 ticks in 500ms; two would double it.
            assert!(consumed <= 35, "consumed {} ticks", consumed);
        }
    }
}
