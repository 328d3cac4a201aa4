//! Tray icon error types.

use thiserror::Error;

/// Errors raised while creating, running or stopping a tray icon.
#[derive(Debug, Error)]
pub enum TrayError {
    /// The tray icon or its menu could not be built.
    #[error("トレイアイコンの作成に失敗しました: {0}")]
    Build(String),

    /// The tray thread could not be started or died.
    #[error("トレイスレッドの起動に失敗しました: {0}")]
    Thread(String),

    /// The tray icon could not be stopped cleanly.
    #[error("トレイアイコンの停止に失敗しました: {0}")]
    Stop(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert!(TrayError::Build("no status bar".into())
            .to_string()
            .contains("no status bar"));
        assert!(TrayError::Stop("gone".into()).to_string().contains("停止"));
    }
}
