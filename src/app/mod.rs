//! UI thread and application wiring.
//!
//! The UI thread owns the window. Every other thread (countdown, tray,
//! unlock monitor, stdin, signals) reaches it only through the
//! [`UiEvent`] queue, so window mutations never race.
//!
//! ```text
//! countdown ─┐
//! tray ──────┤
//! monitor ───┼──▶ UI queue ──▶ App::run ──▶ SessionEngine / VisibilityController
//! stdin ─────┤                                      │
//! signals ───┘                                      ▼
//!                                             ConsoleWindow
//! ```

mod command;
mod console;
mod signals;

pub use command::{parse_command, HELP_TEXT};
pub use console::{ConsoleState, ConsoleWindow};
pub use signals::{spawn_input_reader, spawn_signal_listener};

use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError};
use tracing::{debug, info, warn};

use crate::config::ConfigStore;
use crate::display::UiDisplay;
use crate::menubar::{default_factory, TrayFactory};
use crate::monitor::{default_probe, UnlockMonitor, DEFAULT_POLL_INTERVAL};
use crate::notification::DesktopNotifier;
use crate::session::SessionEngine;
use crate::sound::{get_default_sound, SoundPlayer, SoundWorker};
use crate::types::{DisplayUpdate, Phase, UiEvent};
use crate::visibility::VisibilityController;

/// How long the loop waits for an event when no popup is pending.
const IDLE_WAIT: Duration = Duration::from_secs(1);

// ============================================================================
// AppOptions
// ============================================================================

/// Options for [`launch`].
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Settings file
    pub config_path: PathBuf,
    /// Start hidden in the tray
    pub start_minimized: bool,
    /// Play a sound on completion
    pub sound: bool,
    /// Show a desktop toast on completion
    pub toast: bool,
    /// Watch for session unlocks
    pub unlock_monitor: bool,
    /// Unlock polling interval
    pub poll_interval: Duration,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            config_path: ConfigStore::default_path(),
            start_minimized: false,
            sound: true,
            toast: true,
            unlock_monitor: true,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

// ============================================================================
// App
// ============================================================================

/// Runs `on_quit` when the UI loop ends, however it ends.
struct QuitGuard(Arc<VisibilityController>);

impl Drop for QuitGuard {
    fn drop(&mut self) {
        self.0.on_quit();
    }
}

/// The UI thread's event loop.
pub struct App {
    engine: SessionEngine,
    controller: Arc<VisibilityController>,
    config: Arc<ConfigStore>,
    window: Arc<ConsoleWindow>,
    events: Receiver<UiEvent>,
    popup_deadline: Option<Instant>,
}

impl App {
    pub fn new(
        engine: SessionEngine,
        controller: Arc<VisibilityController>,
        config: Arc<ConfigStore>,
        window: Arc<ConsoleWindow>,
        events: Receiver<UiEvent>,
    ) -> Self {
        Self {
            engine,
            controller,
            config,
            window,
            events,
            popup_deadline: None,
        }
    }

    /// Processes events until quit is requested or every sender is gone.
    pub fn run(&mut self) {
        let _quit = QuitGuard(Arc::clone(&self.controller));

        while !self.controller.is_quit_requested() {
            let wait = self
                .popup_deadline
                .map(|deadline| deadline.saturating_duration_since(Instant::now()))
                .unwrap_or(IDLE_WAIT);

            match self.events.recv_timeout(wait) {
                Ok(event) => {
                    if self.handle(event).is_break() {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => self.expire_popup(),
                Err(RecvTimeoutError::Disconnected) => {
                    debug!("UIキューの送信側がすべて閉じられました");
                    break;
                }
            }
        }

        info!("UIループを終了しました");
    }

    /// Handles one event on the UI thread.
    pub fn handle(&mut self, event: UiEvent) -> ControlFlow<()> {
        match event {
            UiEvent::Start => self.engine.start(),
            UiEvent::TogglePause => {
                self.engine.toggle_pause();
            }
            UiEvent::Reset => self.engine.reset(),
            UiEvent::ApplyDurations { focus, break_ } => {
                if let Err(e) = self.engine.apply_durations(&focus, &break_) {
                    self.window.message(&format!("エラー: {e}"));
                }
            }
            UiEvent::SetAutoStart(enabled) => self.set_auto_start(enabled),
            UiEvent::Minimize => self.controller.minimize_to_tray(),
            UiEvent::TrayShow => self.controller.restore_from_tray(),
            UiEvent::RestoreWindow => self.controller.show_window(),
            UiEvent::TrayFailed { id, reason } => {
                self.controller.handle_tray_failure(id, &reason);
            }
            UiEvent::Unlocked => self.controller.on_unlock(),
            UiEvent::DismissPopup => {
                self.popup_deadline = None;
                self.window.dismiss_popup();
            }
            UiEvent::Status => self.window.message(&self.status_text()),
            UiEvent::Help => self.window.message(HELP_TEXT),
            UiEvent::InputError(message) => self.window.message(&message),
            UiEvent::Render(update) => self.render(update),
            UiEvent::Quit => {
                self.controller.on_quit();
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    fn render(&mut self, update: DisplayUpdate) {
        let refresh_tray = matches!(
            update,
            DisplayUpdate::CountdownText(_) | DisplayUpdate::Controls(_)
        );
        if let DisplayUpdate::PhaseCompletePopup {
            auto_dismiss_secs, ..
        } = &update
        {
            self.popup_deadline = Some(Instant::now() + Duration::from_secs(*auto_dismiss_secs));
        }

        self.window.render(update);

        if refresh_tray && self.controller.is_minimized() {
            self.controller.refresh_tray();
        }
    }

    fn expire_popup(&mut self) {
        let Some(deadline) = self.popup_deadline else {
            return;
        };
        if Instant::now() >= deadline {
            self.popup_deadline = None;
            if self.window.dismiss_popup() {
                debug!("完了メッセージを自動で閉じました");
            }
        }
    }

    fn set_auto_start(&self, enabled: bool) {
        if let Err(e) = self.config.set_auto_start(enabled) {
            warn!(error = %e, "自動開始設定を保存できませんでした");
        }
        let label = if enabled { "オン" } else { "オフ" };
        self.window.message(&format!("ロック解除時の自動開始: {label}"));
    }

    fn status_text(&self) -> String {
        let session = self.engine.snapshot();
        let settings = self.config.settings();
        let state = match (session.running, session.paused) {
            (false, _) => "停止中",
            (true, true) => "一時停止中",
            (true, false) => "実行中",
        };
        let phase = match session.phase {
            Phase::Focus => "作業",
            Phase::Break => "休憩",
        };
        let visibility = if self.controller.is_minimized() {
            "トレイ"
        } else {
            "ウィンドウ"
        };

        format!(
            "ポモドーロタイマー ステータス\n\
             ─────────────────────────────\n\
             状態: {state}\n\
             フェーズ: {phase}\n\
             残り時間: {}\n\
             作業時間: {}分 / 休憩時間: {}分\n\
             自動開始: {}\n\
             表示: {visibility}",
            session.display_text(),
            settings.focus_time,
            settings.break_time,
            if settings.auto_start { "オン" } else { "オフ" },
        )
    }

    /// Returns true if a completion popup is waiting to auto-dismiss.
    pub fn has_pending_popup(&self) -> bool {
        self.popup_deadline.is_some()
    }
}

// ============================================================================
// launch
// ============================================================================

/// Wires every component together and runs the UI loop on this thread.
///
/// # Errors
///
/// Returns an error if a required thread cannot be started.
pub fn launch(options: AppOptions) -> Result<()> {
    let (tx, rx) = unbounded();

    let config = Arc::new(ConfigStore::open(&options.config_path));
    info!(path = %options.config_path.display(), "設定ファイル");

    let sound: Option<Arc<dyn SoundPlayer>> = if options.sound {
        match SoundWorker::spawn(false) {
            Ok(worker) => Some(Arc::new(worker)),
            Err(e) => {
                warn!(error = %e, "通知音を無効にして起動します");
                None
            }
        }
    } else {
        None
    };
    let notifier = DesktopNotifier::new(sound, get_default_sound()).with_toast(options.toast);

    let window = Arc::new(ConsoleWindow::stdout());
    let engine = SessionEngine::new(
        Arc::clone(&config),
        Arc::new(UiDisplay::new(tx.clone())),
        Arc::new(notifier),
    );
    let trays: Arc<dyn TrayFactory> = default_factory();
    let controller = Arc::new(VisibilityController::new(
        window.clone(),
        engine.clone(),
        Arc::clone(&config),
        trays,
        tx.clone(),
    ));

    if options.unlock_monitor {
        let unlock_tx = tx.clone();
        match UnlockMonitor::new(default_probe(), options.poll_interval).spawn(move || {
            let _ = unlock_tx.send(UiEvent::Unlocked);
        }) {
            Ok(handle) => controller.attach_monitor(handle),
            Err(e) => warn!(error = %e, "ロック解除の監視なしで起動します"),
        }
    }

    spawn_signal_listener(tx.clone()).context("シグナル監視スレッドを起動できませんでした")?;
    spawn_input_reader(tx.clone()).context("入力スレッドを起動できませんでした")?;
    drop(tx);

    controller.show_window();
    window.message("help でコマンド一覧を表示します");
    if options.start_minimized {
        controller.minimize_to_tray();
    }

    App::new(engine, controller, config, window, rx).run();
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::console::test_support::SharedBuffer;
    use super::*;
    use crate::config::Settings;
    use crate::menubar::MockTrayFactory;
    use crate::notification::MockNotifier;
    use crossbeam_channel::Sender;

    struct Fixture {
        app: App,
        tx: Sender<UiEvent>,
        engine: SessionEngine,
        controller: Arc<VisibilityController>,
        config: Arc<ConfigStore>,
        window: Arc<ConsoleWindow>,
        buffer: SharedBuffer,
        trays: MockTrayFactory,
    }

    fn fixture() -> Fixture {
        let (tx, rx) = unbounded();
        let config = Arc::new(ConfigStore::in_memory(Settings::default()));
        let buffer = SharedBuffer::default();
        let window = Arc::new(ConsoleWindow::with_writer(Box::new(buffer.clone())));
        let engine = SessionEngine::with_tick(
            Arc::clone(&config),
            Arc::new(UiDisplay::new(tx.clone())),
            Arc::new(MockNotifier::new()),
            Duration::from_secs(3600),
        );
        let trays = MockTrayFactory::new();
        let controller = Arc::new(VisibilityController::new(
            window.clone(),
            engine.clone(),
            Arc::clone(&config),
            Arc::new(trays.clone()),
            tx.clone(),
        ));
        let app = App::new(
            engine.clone(),
            Arc::clone(&controller),
            Arc::clone(&config),
            window.clone(),
            rx,
        );
        Fixture {
            app,
            tx,
            engine,
            controller,
            config,
            window,
            buffer,
            trays,
        }
    }

    /// Handles queued events until the queue is empty.
    fn pump(f: &mut Fixture) {
        while let Ok(event) = f.app.events.try_recv() {
            if f.app.handle(event).is_break() {
                break;
            }
        }
    }

    mod handle_tests {
        use super::*;
        use crate::visibility::Window;

        #[test]
        fn test_initial_render_through_queue() {
            let mut f = fixture();
            pump(&mut f);
            assert_eq!(f.window.snapshot().countdown, "25:00");
        }

        #[test]
        fn test_start_and_pause() {
            let mut f = fixture();
            f.app.handle(UiEvent::Start);
            assert!(f.engine.snapshot().running);

            f.app.handle(UiEvent::TogglePause);
            pump(&mut f);
            assert!(f.engine.snapshot().paused);
            assert_eq!(f.window.snapshot().controls.pause_label, "再開");
            f.app.handle(UiEvent::Reset);
        }

        #[test]
        fn test_invalid_durations_show_error() {
            let mut f = fixture();
            f.app.handle(UiEvent::ApplyDurations {
                focus: "-5".to_string(),
                break_: "5".to_string(),
            });
            pump(&mut f);

            assert!(f.buffer.contents().contains("エラー"));
            assert_eq!(
                f.window.snapshot().durations,
                Some(crate::types::Durations::new(25, 5).unwrap())
            );
        }

        #[test]
        fn test_auto_start_toggle_persists_in_store() {
            let mut f = fixture();
            f.app.handle(UiEvent::SetAutoStart(false));
            assert!(!f.config.auto_start());
            assert!(f.buffer.contents().contains("オフ"));
        }

        #[test]
        fn test_minimize_show_cycle() {
            let mut f = fixture();
            f.app.handle(UiEvent::Minimize);
            assert!(!f.window.is_visible());
            assert_eq!(f.trays.spawn_count(), 1);

            f.app.handle(UiEvent::TrayShow);
            pump(&mut f);
            assert!(f.window.is_visible());
            assert!(!f.controller.state().tray_icon_active);
        }

        #[test]
        fn test_unlock_then_minimize_stays_in_tray() {
            let mut f = fixture();
            f.app.handle(UiEvent::Unlocked);
            f.app.handle(UiEvent::Minimize);
            pump(&mut f);

            assert!(!f.window.is_visible());
            assert!(f.controller.state().tray_icon_active);
            f.engine.stop();
        }

        #[test]
        fn test_countdown_refreshes_tray_while_minimized() {
            let mut f = fixture();
            f.app.handle(UiEvent::Minimize);
            f.app
                .handle(UiEvent::Render(DisplayUpdate::CountdownText("12:34".to_string())));
            assert_eq!(f.trays.updates().len(), 1);
        }

        #[test]
        fn test_popup_deadline() {
            let mut f = fixture();
            f.app.handle(UiEvent::Render(DisplayUpdate::PhaseCompletePopup {
                message: "done".to_string(),
                auto_dismiss_secs: 0,
            }));
            assert!(f.app.has_pending_popup());

            f.app.expire_popup();
            assert!(!f.app.has_pending_popup());
            assert!(f.window.snapshot().popup.is_none());
        }

        #[test]
        fn test_dismiss_popup() {
            let mut f = fixture();
            f.app.handle(UiEvent::Render(DisplayUpdate::PhaseCompletePopup {
                message: "done".to_string(),
                auto_dismiss_secs: 5,
            }));
            f.app.handle(UiEvent::DismissPopup);
            assert!(!f.app.has_pending_popup());
            assert!(f.window.snapshot().popup.is_none());
        }

        #[test]
        fn test_status_and_help() {
            let mut f = fixture();
            f.app.handle(UiEvent::Status);
            f.app.handle(UiEvent::Help);
            let out = f.buffer.contents();
            assert!(out.contains("状態: 停止中"));
            assert!(out.contains("コマンド:"));
        }

        #[test]
        fn test_unlock_event_starts_engine() {
            let mut f = fixture();
            f.app.handle(UiEvent::Unlocked);
            assert!(f.engine.snapshot().running);
            f.app.handle(UiEvent::Reset);
        }
    }

    mod run_tests {
        use super::*;

        #[test]
        fn test_quit_ends_loop_and_cleans_up() {
            let mut f = fixture();
            f.tx.send(UiEvent::Start).unwrap();
            f.tx.send(UiEvent::Minimize).unwrap();
            f.tx.send(UiEvent::Quit).unwrap();

            f.app.run();

            assert!(f.controller.is_quit_requested());
            assert!(!f.engine.snapshot().running);
            assert!(!f.controller.state().tray_icon_active);
        }

        #[test]
        fn test_loop_runs_quit_path_when_senders_close() {
            let (tx, rx) = unbounded::<UiEvent>();
            let f = fixture();
            let mut app = App::new(
                f.engine.clone(),
                Arc::clone(&f.controller),
                Arc::clone(&f.config),
                f.window.clone(),
                rx,
            );
            drop(tx);

            app.run();

            assert!(f.controller.is_quit_requested());
        }
    }
}
