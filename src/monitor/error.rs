//! Unlock monitor error types.

use thiserror::Error;

/// Errors raised while probing the session lock state.
///
/// Probe errors are transient from the monitor's point of view: they are
/// logged and the previous observation is kept.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The probe command could not be executed.
    #[error("ロック状態の確認コマンドを実行できません: {0}")]
    CommandExecution(String),

    /// The probe command ran but reported failure.
    #[error("ロック状態の確認に失敗しました: {0}")]
    ProbeFailed(String),

    /// The probe output could not be interpreted.
    #[error("ロック状態を解釈できません: {0}")]
    UnexpectedOutput(String),

    /// The monitor thread could not be started.
    #[error("監視スレッドの起動に失敗しました: {0}")]
    Thread(String),
}
