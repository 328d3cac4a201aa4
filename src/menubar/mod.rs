//! Tray icon for the minimized mode.
//!
//! This module provides:
//! - Title text for the tray (e.g., "🍅 15:30")
//! - A Show / Exit menu
//! - Tray icon lifecycle behind the [`TrayFactory`] seam
//!
//! # Architecture
//!
//! - `icon.rs`: Title text generation (platform-independent, fully testable)
//! - `menu.rs`: Menu configuration (platform-independent, fully testable)
//! - `event.rs`: Click → [`UiEvent`] translation (platform-independent)
//!
//! The tray is headless on every platform: the app has no native event
//! loop for an OS status item to live on, so the icon is a thread that
//! reports its title and menu to the log and is restored with `show`.
//!
//! Every minimize builds a fresh icon on its own thread; icons are never
//! reused across show/hide cycles. The thread owns the icon and receives
//! [`TrayCommand`]s over a channel. Menu clicks travel the other way as
//! [`UiEvent`]s on the UI queue.
//!
//! ```text
//! VisibilityController ──spawn──▶ TrayFactory ──▶ tray thread (owns icon)
//!        │                                            │
//!        └──── TrayHandle::update / stop ─────────────┤
//!                                                     ▼
//!                       UI queue ◀── TrayShow / Quit / TrayFailed
//! ```

mod error;
pub mod event;
pub mod icon;
pub mod menu;

pub use error::TrayError;
pub use event::{EventHandler, MenuAction, MenuItemId};
pub use icon::IconManager;
pub use menu::{MenuBuilder, MenuConfig, MenuItemConfig, TRAY_TOOLTIP};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::types::{SessionState, UiEvent};

// ============================================================================
// TrayView / TrayContext
// ============================================================================

/// What a tray icon shows: its title and its menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrayView {
    /// Title next to the icon
    pub title: String,
    /// Menu contents
    pub menu: MenuConfig,
}

impl TrayView {
    /// Builds the view for a session state.
    pub fn for_state(state: &SessionState) -> Self {
        Self {
            title: IconManager::new().generate_title(state),
            menu: MenuBuilder::new().build(state),
        }
    }
}

/// Everything a factory needs to bring up one tray icon.
#[derive(Debug, Clone)]
pub struct TrayContext {
    /// Id of this icon; reported back in [`UiEvent::TrayFailed`]
    pub id: u64,
    /// Initial view
    pub view: TrayView,
    /// UI queue for menu actions and failures
    pub events: Sender<UiEvent>,
}

impl TrayContext {
    /// Reports a dead tray loop to the UI thread.
    pub fn report_failure(&self, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::warn!(id = self.id, reason = %reason, "トレイアイコンが異常終了しました");
        let _ = self.events.send(UiEvent::TrayFailed {
            id: self.id,
            reason,
        });
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Builds tray icons.
pub trait TrayFactory: Send + Sync {
    /// Creates a tray icon and starts its event loop on a new thread.
    ///
    /// Returns only after the icon exists (or failed to).
    ///
    /// # Errors
    ///
    /// Returns an error if the icon or its thread cannot be created.
    fn spawn(&self, context: TrayContext) -> Result<Box<dyn TrayHandle>, TrayError>;
}

/// Owner-side handle to a live tray icon.
pub trait TrayHandle: Send {
    /// Replaces the title and menu.
    fn update(&self, view: TrayView);

    /// Stops the tray loop and removes the icon.
    ///
    /// # Errors
    ///
    /// Returns an error if the tray thread is already gone.
    fn stop(&self) -> Result<(), TrayError>;
}

/// Message to a tray thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrayCommand {
    /// Replace the title and menu
    Update(TrayView),
    /// Remove the icon and end the thread
    Stop,
}

/// Handle to a tray thread driven by [`TrayCommand`]s.
#[derive(Debug)]
pub struct TrayThreadHandle {
    id: u64,
    commands: Sender<TrayCommand>,
}

impl TrayThreadHandle {
    fn new(id: u64, commands: Sender<TrayCommand>) -> Self {
        Self { id, commands }
    }
}

impl TrayHandle for TrayThreadHandle {
    fn update(&self, view: TrayView) {
        if self.commands.send(TrayCommand::Update(view)).is_err() {
            tracing::debug!(id = self.id, "トレイスレッドが終了しているため更新を破棄しました");
        }
    }

    fn stop(&self) -> Result<(), TrayError> {
        self.commands
            .send(TrayCommand::Stop)
            .map_err(|_| TrayError::Stop(format!("tray thread {} is not running", self.id)))
    }
}

/// Returns the tray factory used by the app.
pub fn default_factory() -> Arc<dyn TrayFactory> {
    Arc::new(HeadlessTrayFactory::new())
}

// ============================================================================
// HeadlessTrayFactory
// ============================================================================

/// Tray without a native icon: the thread logs its title and menu and waits
/// for stop. The window is restored with the `show` command.
#[derive(Debug, Default)]
pub struct HeadlessTrayFactory;

impl HeadlessTrayFactory {
    pub fn new() -> Self {
        Self
    }
}

impl TrayFactory for HeadlessTrayFactory {
    fn spawn(&self, context: TrayContext) -> Result<Box<dyn TrayHandle>, TrayError> {
        let (tx, rx) = unbounded();
        let id = context.id;

        thread::Builder::new()
            .name(format!("tray-{id}"))
            .spawn(move || run_headless(context, rx))
            .map_err(|e| TrayError::Thread(e.to_string()))?;

        Ok(Box::new(TrayThreadHandle::new(id, tx)))
    }
}

fn run_headless(context: TrayContext, commands: Receiver<TrayCommand>) {
    tracing::info!(
        id = context.id,
        title = %context.view.title,
        "トレイに格納しました（`show` で復元）"
    );
    log_menu(context.id, &context.view.menu);

    for command in commands.iter() {
        match command {
            TrayCommand::Update(view) => {
                tracing::trace!(
                    id = context.id,
                    title = %view.title,
                    status = %view.menu.status.text,
                    "トレイ表示更新"
                );
            }
            TrayCommand::Stop => break,
        }
    }

    tracing::debug!(id = context.id, "トレイスレッド終了");
}

fn log_menu(id: u64, menu: &MenuConfig) {
    for item in menu.items() {
        tracing::debug!(
            id,
            item = ?item.id,
            text = %item.text,
            enabled = item.enabled,
            "トレイメニュー項目"
        );
    }
}

// ============================================================================
// MockTrayFactory
// ============================================================================

#[derive(Debug, Default)]
struct MockTrayRecords {
    spawned: Vec<TrayContext>,
    stopped: Vec<u64>,
    updates: Vec<(u64, TrayView)>,
}

#[derive(Debug, Default)]
struct MockTrayInner {
    records: Mutex<MockTrayRecords>,
    fail_spawn: AtomicBool,
    fail_stop: AtomicBool,
}

impl MockTrayInner {
    fn records(&self) -> MutexGuard<'_, MockTrayRecords> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Tray factory that records every icon, for tests.
///
/// Clones share their records.
#[derive(Debug, Clone, Default)]
pub struct MockTrayFactory {
    inner: Arc<MockTrayInner>,
}

impl MockTrayFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent `spawn` calls fail.
    pub fn set_should_fail(&self, fail: bool) {
        self.inner.fail_spawn.store(fail, Ordering::SeqCst);
    }

    /// Makes subsequent `stop` calls fail.
    pub fn set_should_fail_stop(&self, fail: bool) {
        self.inner.fail_stop.store(fail, Ordering::SeqCst);
    }

    /// Number of icons built so far.
    pub fn spawn_count(&self) -> usize {
        self.inner.records().spawned.len()
    }

    /// Ids of icons built and not yet stopped.
    pub fn active_ids(&self) -> Vec<u64> {
        let records = self.inner.records();
        records
            .spawned
            .iter()
            .map(|ctx| ctx.id)
            .filter(|id| !records.stopped.contains(id))
            .collect()
    }

    /// Ids of stopped icons, in stop order.
    pub fn stopped_ids(&self) -> Vec<u64> {
        self.inner.records().stopped.clone()
    }

    /// Context of the most recently built icon.
    pub fn last_context(&self) -> Option<TrayContext> {
        self.inner.records().spawned.last().cloned()
    }

    /// Views pushed to icons through [`TrayHandle::update`].
    pub fn updates(&self) -> Vec<(u64, TrayView)> {
        self.inner.records().updates.clone()
    }

    /// Simulates a menu click on icon `id`.
    pub fn click(&self, id: u64, item: MenuItemId) -> bool {
        let context = self
            .inner
            .records()
            .spawned
            .iter()
            .find(|ctx| ctx.id == id)
            .cloned();
        match context {
            Some(ctx) => EventHandler::new().dispatch(item, &ctx.events),
            None => false,
        }
    }

    /// Simulates icon `id` dying.
    pub fn fail(&self, id: u64, reason: &str) {
        let context = self
            .inner
            .records()
            .spawned
            .iter()
            .find(|ctx| ctx.id == id)
            .cloned();
        if let Some(ctx) = context {
            ctx.report_failure(reason);
        }
    }
}

impl TrayFactory for MockTrayFactory {
    fn spawn(&self, context: TrayContext) -> Result<Box<dyn TrayHandle>, TrayError> {
        if self.inner.fail_spawn.load(Ordering::SeqCst) {
            return Err(TrayError::Build("mock build failure".to_string()));
        }
        let id = context.id;
        self.inner.records().spawned.push(context);
        Ok(Box::new(MockTrayHandle {
            id,
            inner: Arc::clone(&self.inner),
        }))
    }
}

#[derive(Debug)]
struct MockTrayHandle {
    id: u64,
    inner: Arc<MockTrayInner>,
}

impl TrayHandle for MockTrayHandle {
    fn update(&self, view: TrayView) {
        self.inner.records().updates.push((self.id, view));
    }

    fn stop(&self) -> Result<(), TrayError> {
        self.inner.records().stopped.push(self.id);
        if self.inner.fail_stop.load(Ordering::SeqCst) {
            return Err(TrayError::Stop("mock stop failure".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
