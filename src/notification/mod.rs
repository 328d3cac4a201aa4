//! Desktop notification port.
//!
//! A completion alert is an audible bell followed by a desktop toast. Both
//! halves are best effort: a missing audio device or notification daemon is
//! logged and otherwise ignored, so the countdown thread that raises the
//! alert is never interrupted.

pub mod error;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use notify_rust::{Notification, Timeout};
use tracing::{debug, warn};

pub use self::error::NotificationError;

use crate::sound::{SoundPlayer, SoundSource};

/// Application name shown by the notification daemon.
const APP_NAME: &str = "Pomodoro Timer";

/// How long the toast stays on screen.
const TOAST_TIMEOUT_MS: u32 = 10_000;

/// Fire-and-forget alert output.
pub trait NotificationPort: Send + Sync {
    /// Raises an alert. Never fails from the caller's point of view.
    fn notify(&self, title: &str, message: &str);
}

// ============================================================================
// DesktopNotifier
// ============================================================================

/// Sound + desktop toast notifier.
pub struct DesktopNotifier {
    sound: Option<Arc<dyn SoundPlayer>>,
    sound_source: SoundSource,
    toast_enabled: bool,
}

impl DesktopNotifier {
    /// Creates a notifier; `sound` is `None` when audio is disabled.
    pub fn new(sound: Option<Arc<dyn SoundPlayer>>, sound_source: SoundSource) -> Self {
        Self {
            sound,
            sound_source,
            toast_enabled: true,
        }
    }

    /// Enables or disables the desktop toast (the sound is unaffected).
    #[must_use]
    pub fn with_toast(mut self, enabled: bool) -> Self {
        self.toast_enabled = enabled;
        self
    }

    fn play_sound(&self) -> Result<(), NotificationError> {
        match &self.sound {
            Some(player) => Ok(player.play(&self.sound_source)?),
            None => Ok(()),
        }
    }

    fn show_toast(&self, title: &str, message: &str) -> Result<(), NotificationError> {
        if !self.toast_enabled {
            return Ok(());
        }
        Notification::new()
            .summary(title)
            .body(message)
            .appname(APP_NAME)
            .timeout(Timeout::Milliseconds(TOAST_TIMEOUT_MS))
            .show()
            .map(|_| ())
            .map_err(|e| NotificationError::SendFailed(e.to_string()))
    }
}

impl NotificationPort for DesktopNotifier {
    fn notify(&self, title: &str, message: &str) {
        if let Err(e) = self.play_sound() {
            warn!(error = %e, "通知音を再生できませんでした");
        }
        match self.show_toast(title, message) {
            Ok(()) => debug!(title, "デスクトップ通知を送信しました"),
            Err(e) => warn!(error = %e, title, "デスクトップ通知を表示できませんでした"),
        }
    }
}

impl std::fmt::Debug for DesktopNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DesktopNotifier")
            .field("sound_enabled", &self.sound.is_some())
            .field("sound_source", &self.sound_source)
            .field("toast_enabled", &self.toast_enabled)
            .finish()
    }
}

// ============================================================================
// MockNotifier
// ============================================================================

/// Notifier that records alerts, for tests.
#[derive(Debug, Default)]
pub struct MockNotifier {
    notifications: Mutex<Vec<(String, String)>>,
    should_fail: AtomicBool,
}

impl MockNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent alerts fail internally (they are still swallowed).
    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    /// Returns the `(title, message)` pairs delivered so far.
    #[must_use]
    pub fn get_notifications(&self) -> Vec<(String, String)> {
        self.lock().clone()
    }

    #[must_use]
    pub fn notification_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(String, String)>> {
        self.notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl NotificationPort for MockNotifier {
    fn notify(&self, title: &str, message: &str) {
        if self.should_fail.load(Ordering::SeqCst) {
            warn!(title, "Mock notification failure");
            return;
        }
        self.lock().push((title.to_string(), message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sound::MockSoundPlayer;

    #[test]
    fn test_mock_records() {
        let notifier = MockNotifier::new();
        notifier.notify("休憩時間です", "5分間の休憩を取りましょう。");

        assert_eq!(notifier.notification_count(), 1);
        assert_eq!(notifier.get_notifications()[0].0, "休憩時間です");
    }

    #[test]
    fn test_mock_failure_is_swallowed() {
        let notifier = MockNotifier::new();
        notifier.set_should_fail(true);
        notifier.notify("title", "message");
        assert_eq!(notifier.notification_count(), 0);
    }

    #[test]
    fn test_desktop_notifier_plays_sound() {
        let player = Arc::new(MockSoundPlayer::new());
        let sound: Arc<dyn SoundPlayer> = player.clone();
        let notifier = DesktopNotifier::new(Some(sound), SoundSource::Bell).with_toast(false);

        notifier.notify("テスト", "通知テスト");

        assert_eq!(player.play_count(), 1);
    }

    #[test]
    fn test_desktop_notifier_sound_failure_is_swallowed() {
        let player = Arc::new(MockSoundPlayer::new());
        player.set_should_fail(true);
        let sound: Arc<dyn SoundPlayer> = player.clone();
        let notifier = DesktopNotifier::new(Some(sound), SoundSource::Bell).with_toast(false);

        notifier.notify("テスト", "通知テスト");
        assert_eq!(player.play_count(), 0);
    }

    #[test]
    fn test_desktop_notifier_debug() {
        let notifier = DesktopNotifier::new(None, SoundSource::Bell);
        let debug = format!("{:?}", notifier);
        assert!(debug.contains("sound_enabled: false"));
    }
}
