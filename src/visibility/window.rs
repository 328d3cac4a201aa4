//! Main window abstraction.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use thiserror::Error;

/// Errors raised by window operations.
#[derive(Debug, Error)]
pub enum WindowError {
    /// The window could not be hidden.
    #[error("ウィンドウを隠せませんでした: {0}")]
    Hide(String),

    /// The window could not be shown again.
    #[error("ウィンドウを表示できませんでした: {0}")]
    Restore(String),
}

/// The application's main window.
///
/// Methods must only be called on the UI thread.
pub trait Window: Send + Sync {
    /// Hides (withdraws) the window.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform refuses to hide the window.
    fn hide(&self) -> Result<(), WindowError>;

    /// Shows the window again, raised and focused.
    ///
    /// # Errors
    ///
    /// Returns an error if the window cannot be shown.
    fn restore(&self) -> Result<(), WindowError>;

    /// Returns true if the window is currently shown.
    fn is_visible(&self) -> bool;
}

/// Window that records calls, for tests.
#[derive(Debug)]
pub struct MockWindow {
    visible: AtomicBool,
    hide_calls: AtomicUsize,
    restore_calls: AtomicUsize,
    fail_hide: AtomicBool,
    fail_restore: AtomicBool,
}

impl Default for MockWindow {
    fn default() -> Self {
        Self {
            visible: AtomicBool::new(true),
            hide_calls: AtomicUsize::new(0),
            restore_calls: AtomicUsize::new(0),
            fail_hide: AtomicBool::new(false),
            fail_restore: AtomicBool::new(false),
        }
    }
}

impl MockWindow {
    /// Creates a visible window.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hide_calls(&self) -> usize {
        self.hide_calls.load(Ordering::SeqCst)
    }

    pub fn restore_calls(&self) -> usize {
        self.restore_calls.load(Ordering::SeqCst)
    }

    pub fn set_fail_hide(&self, fail: bool) {
        self.fail_hide.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_restore(&self, fail: bool) {
        self.fail_restore.store(fail, Ordering::SeqCst);
    }
}

impl Window for MockWindow {
    fn hide(&self) -> Result<(), WindowError> {
        self.hide_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_hide.load(Ordering::SeqCst) {
            return Err(WindowError::Hide("mock failure".to_string()));
        }
        self.visible.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn restore(&self) -> Result<(), WindowError> {
        self.restore_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_restore.load(Ordering::SeqCst) {
            return Err(WindowError::Restore("mock failure".to_string()));
        }
        self.visible.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }
}
