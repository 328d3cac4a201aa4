//! Session unlock monitor.
//!
//! Polls a [`LockProbe`] on its own thread and invokes a callback once per
//! locked → unlocked transition. The callback runs on the monitor thread,
//! so callers hand the event to the UI queue instead of acting on it
//! directly.

mod error;
mod probe;

pub use error::MonitorError;
pub use probe::{
    default_probe, parse_ioreg, parse_locked_hint, IoregProbe, LockProbe, LoginctlProbe,
    MockLockProbe, NullProbe,
};

use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use tracing::{debug, info, warn};

/// Default polling interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

// ============================================================================
// UnlockDetector
// ============================================================================

/// Edge detector over successive lock observations.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnlockDetector {
    last_locked: Option<bool>,
}

impl UnlockDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an observation; returns true on a locked → unlocked edge.
    ///
    /// The first observation only sets the baseline.
    pub fn observe(&mut self, locked: bool) -> bool {
        let unlocked_now = self.last_locked == Some(true) && !locked;
        self.last_locked = Some(locked);
        unlocked_now
    }

    /// Last observed state, if any.
    pub fn last_locked(&self) -> Option<bool> {
        self.last_locked
    }
}

// ============================================================================
// UnlockMonitor
// ============================================================================

/// Polling unlock monitor.
pub struct UnlockMonitor {
    probe: Box<dyn LockProbe>,
    interval: Duration,
}

impl UnlockMonitor {
    pub fn new(probe: Box<dyn LockProbe>, interval: Duration) -> Self {
        Self { probe, interval }
    }

    /// Starts polling on a thread named `unlock-monitor`.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn spawn<F>(self, on_unlock: F) -> Result<MonitorHandle, MonitorError>
    where
        F: Fn() + Send + 'static,
    {
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let Self { probe, interval } = self;

        thread::Builder::new()
            .name("unlock-monitor".to_string())
            .spawn(move || {
                info!(
                    probe = probe.name(),
                    interval_secs = interval.as_secs(),
                    "ロック解除の監視を開始しました"
                );
                let mut detector = UnlockDetector::new();

                loop {
                    match probe.is_locked() {
                        Ok(locked) => {
                            if detector.observe(locked) {
                                info!("セッションのロック解除を検出しました");
                                on_unlock();
                            }
                        }
                        Err(e) => {
                            warn!(
                                error = %e,
                                "ロック状態を取得できませんでした（監視は継続します）"
                            );
                        }
                    }

                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }

                debug!("ロック解除の監視を終了しました");
            })
            .map_err(|e| MonitorError::Thread(e.to_string()))?;

        Ok(MonitorHandle { stop_tx })
    }
}

impl std::fmt::Debug for UnlockMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnlockMonitor")
            .field("probe", &self.probe.name())
            .field("interval", &self.interval)
            .finish()
    }
}

/// Handle to a running monitor thread.
///
/// Dropping the handle also stops the thread.
#[derive(Debug)]
pub struct MonitorHandle {
    stop_tx: Sender<()>,
}

impl MonitorHandle {
    /// Asks the monitor thread to exit. Safe to call more than once.
    pub fn stop(&self) {
        let _ = self.stop_tx.try_send(());
    }
}
