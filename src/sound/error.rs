//! Sound system error types.
//!
//! Sound is always optional: every error here degrades to a silent alert.

use thiserror::Error;

/// Errors that can occur in the sound playback system.
#[derive(Debug, Error)]
pub enum SoundError {
    /// Audio device is not available (e.g., no speakers connected).
    #[error("オーディオデバイスが利用できません: {0}")]
    DeviceNotAvailable(String),

    /// Sound file was not found at the specified path.
    #[error("サウンドファイルが見つかりません: {0}")]
    FileNotFound(String),

    /// Failed to decode the audio file.
    #[error("サウンドファイルのデコードに失敗しました: {0}")]
    DecodeError(String),

    /// Failed to create the audio output stream.
    #[error("オーディオストリームの作成に失敗しました: {0}")]
    StreamError(String),

    /// The audio thread is gone or playback failed otherwise.
    #[error("サウンド再生エラー: {0}")]
    PlaybackError(String),
}

impl SoundError {
    /// Returns true if this error is related to device availability.
    #[must_use]
    pub fn is_device_error(&self) -> bool {
        matches!(self, Self::DeviceNotAvailable(_) | Self::StreamError(_))
    }

    /// Returns true if this error is related to the audio file.
    #[must_use]
    pub fn is_file_error(&self) -> bool {
        matches!(self, Self::FileNotFound(_) | Self::DecodeError(_))
    }
}
