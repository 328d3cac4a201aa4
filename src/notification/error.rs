//! Notification error types.

use thiserror::Error;

/// Errors that can occur while raising a desktop notification.
///
/// These never leave the notification module: [`super::NotificationPort`]
/// logs and swallows them.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// The desktop notification service rejected or could not show the toast.
    #[error("通知の送信に失敗しました: {0}")]
    SendFailed(String),

    /// The alert sound could not be played.
    #[error("通知音の再生に失敗しました: {0}")]
    Sound(#[from] crate::sound::SoundError),
}
