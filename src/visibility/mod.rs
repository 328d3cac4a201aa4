//! Window / tray visibility controller.
//!
//! Owns the "shown vs. minimized to tray" state and keeps it consistent
//! with the tray icon lifecycle, unlock events and shutdown.
//!
//! All entry points are called on the UI thread (events from the tray and
//! the unlock monitor arrive through the UI queue). The tray slot is still
//! guarded by a mutex because a tray thread can die at any moment and its
//! failure report must never discard a newer icon.

mod window;

pub use window::{MockWindow, Window, WindowError};

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crossbeam_channel::Sender;
use tracing::{debug, info, warn};

use crate::config::ConfigStore;
use crate::menubar::{TrayContext, TrayFactory, TrayHandle, TrayView};
use crate::monitor::MonitorHandle;
use crate::session::SessionEngine;
use crate::types::{UiEvent, VisibilityState};

/// The tray icon currently on screen.
struct ActiveTray {
    id: u64,
    handle: Box<dyn TrayHandle>,
}

/// Holds the in-flight flag for the duration of one minimize.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// ============================================================================
// VisibilityController
// ============================================================================

/// Mediates between the window, the tray icon, unlock events and the
/// session engine.
pub struct VisibilityController {
    window: Arc<dyn Window>,
    engine: SessionEngine,
    config: Arc<ConfigStore>,
    trays: Arc<dyn TrayFactory>,
    events: Sender<UiEvent>,
    minimized: AtomicBool,
    minimize_in_flight: AtomicBool,
    tray: Mutex<Option<ActiveTray>>,
    next_tray_id: AtomicU64,
    monitor: Mutex<Option<MonitorHandle>>,
    quit_requested: AtomicBool,
}

impl VisibilityController {
    /// Creates a controller for a shown window with no tray icon.
    pub fn new(
        window: Arc<dyn Window>,
        engine: SessionEngine,
        config: Arc<ConfigStore>,
        trays: Arc<dyn TrayFactory>,
        events: Sender<UiEvent>,
    ) -> Self {
        Self {
            window,
            engine,
            config,
            trays,
            events,
            minimized: AtomicBool::new(false),
            minimize_in_flight: AtomicBool::new(false),
            tray: Mutex::new(None),
            next_tray_id: AtomicU64::new(0),
            monitor: Mutex::new(None),
            quit_requested: AtomicBool::new(false),
        }
    }

    fn tray_slot(&self) -> MutexGuard<'_, Option<ActiveTray>> {
        self.tray.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hides the window and shows a freshly built tray icon.
    ///
    /// Re-entrant calls while a minimize is in progress, and calls while
    /// already minimized, are ignored. If the icon cannot be built the
    /// window is shown again.
    pub fn minimize_to_tray(&self) {
        let Some(_in_flight) = InFlightGuard::acquire(&self.minimize_in_flight) else {
            debug!("最小化処理中のため要求を無視しました");
            return;
        };

        if self.minimized.load(Ordering::Acquire) {
            debug!("既にトレイに格納されています");
            return;
        }

        if let Err(e) = self.window.hide() {
            warn!(error = %e, "ウィンドウを隠せないため最小化を中止しました");
            return;
        }
        self.minimized.store(true, Ordering::Release);

        let id = self.next_tray_id.fetch_add(1, Ordering::Relaxed) + 1;
        let context = TrayContext {
            id,
            view: TrayView::for_state(&self.engine.snapshot()),
            events: self.events.clone(),
        };

        match self.trays.spawn(context) {
            Ok(handle) => {
                let previous = self.tray_slot().replace(ActiveTray { id, handle });
                if let Some(previous) = previous {
                    Self::stop_tray(previous);
                }
                info!(tray_id = id, "トレイに最小化しました");
            }
            Err(e) => {
                warn!(error = %e, "トレイアイコンを作成できないためウィンドウを再表示します");
                self.minimized.store(false, Ordering::Release);
                self.show_window();
            }
        }
    }

    /// Removes the tray icon (if any) and schedules the window to be shown
    /// on the UI thread.
    pub fn restore_from_tray(&self) {
        self.teardown_tray();
        self.minimized.store(false, Ordering::Release);
        self.post(UiEvent::RestoreWindow);
    }

    /// Shows, raises and focuses the window. UI thread only.
    ///
    /// A restore posted before a later minimize is dropped: the window
    /// stays hidden while a tray icon is up.
    pub fn show_window(&self) {
        if self.minimized.load(Ordering::Acquire) || self.tray_slot().is_some() {
            debug!("トレイに格納中のためウィンドウの再表示を見送りました");
            return;
        }
        match self.window.restore() {
            Ok(()) => debug!("ウィンドウを表示しました"),
            Err(e) => warn!(error = %e, "ウィンドウを表示できませんでした"),
        }
    }

    /// Handles a session unlock.
    ///
    /// Starts the timer only when auto-start is on and the window is not
    /// minimized; a minimized app stays in the tray.
    pub fn on_unlock(&self) {
        if !self.config.auto_start() {
            debug!("自動開始が無効のためロック解除を無視しました");
            return;
        }
        if self.minimized.load(Ordering::Acquire) {
            debug!("トレイに格納中のため自動開始しません");
            return;
        }

        info!("ロック解除によりタイマーを自動開始します");
        self.post(UiEvent::RestoreWindow);
        self.engine.start();
    }

    /// Shuts everything down. Only the first call has an effect.
    pub fn on_quit(&self) {
        if self.quit_requested.swap(true, Ordering::AcqRel) {
            return;
        }

        info!("終了処理を開始します");
        self.engine.stop();
        self.teardown_tray();

        let monitor = self
            .monitor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(monitor) = monitor {
            monitor.stop();
        }
    }

    /// Handles a tray thread that died.
    ///
    /// The slot is cleared only if it still holds icon `id`; a minimized
    /// window is brought back so the app stays reachable.
    pub fn handle_tray_failure(&self, id: u64, reason: &str) {
        let failed = {
            let mut slot = self.tray_slot();
            match slot.as_ref() {
                Some(active) if active.id == id => slot.take(),
                _ => None,
            }
        };

        let Some(failed) = failed else {
            debug!(tray_id = id, "古いトレイアイコンの失敗通知を無視しました");
            return;
        };
        warn!(tray_id = id, reason, "トレイアイコンが失われました");
        drop(failed);

        if self.minimized.swap(false, Ordering::AcqRel) {
            self.post(UiEvent::RestoreWindow);
        }
    }

    /// Pushes the current session state to the tray icon, if any.
    pub fn refresh_tray(&self) {
        let slot = self.tray_slot();
        if let Some(active) = slot.as_ref() {
            active.handle.update(TrayView::for_state(&self.engine.snapshot()));
        }
    }

    /// Takes ownership of the unlock monitor so quitting can stop it.
    pub fn attach_monitor(&self, handle: MonitorHandle) {
        let previous = self
            .monitor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle);
        if let Some(previous) = previous {
            previous.stop();
        }
    }

    /// Returns a snapshot of the visibility state.
    pub fn state(&self) -> VisibilityState {
        VisibilityState {
            is_minimized: self.minimized.load(Ordering::Acquire),
            tray_icon_active: self.tray_slot().is_some(),
            minimize_in_flight: self.minimize_in_flight.load(Ordering::Acquire),
        }
    }

    pub fn is_minimized(&self) -> bool {
        self.minimized.load(Ordering::Acquire)
    }

    pub fn is_quit_requested(&self) -> bool {
        self.quit_requested.load(Ordering::Acquire)
    }

    fn teardown_tray(&self) {
        let active = self.tray_slot().take();
        if let Some(active) = active {
            Self::stop_tray(active);
        }
    }

    fn stop_tray(active: ActiveTray) {
        match active.handle.stop() {
            Ok(()) => debug!(tray_id = active.id, "トレイアイコンを停止しました"),
            Err(e) => warn!(tray_id = active.id, error = %e, "トレイアイコンの停止に失敗しました"),
        }
    }

    fn post(&self, event: UiEvent) {
        if self.events.send(event).is_err() {
            debug!("UIキューが閉じているためイベントを破棄しました");
        }
    }
}

impl std::fmt::Debug for VisibilityController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisibilityController")
            .field("state", &self.state())
            .field("quit_requested", &self.is_quit_requested())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
