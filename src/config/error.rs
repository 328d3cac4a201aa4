//! Settings persistence errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading or saving settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading or writing the settings file failed.
    #[error("設定ファイルの読み書きに失敗しました ({path}): {source}")]
    Io {
        /// Settings file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The settings file contents are not valid JSON settings.
    #[error("設定ファイルの形式が不正です ({path}): {source}")]
    Parse {
        /// Settings file path
        path: PathBuf,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// Settings could not be encoded.
    #[error("設定のシリアライズに失敗しました: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ConfigError {
    /// Returns true if the error means the file simply does not exist yet.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}
