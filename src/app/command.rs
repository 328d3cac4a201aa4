//! Text commands typed into the window.

use crate::types::UiEvent;

/// Help shown for `help`.
pub const HELP_TEXT: &str = "\
コマンド:
  start              タイマーを開始
  pause / resume     一時停止 / 再開
  reset              現在のフェーズを最初からやり直す
  set <作業> <休憩>  作業時間と休憩時間（分）を設定
  auto on|off        ロック解除時の自動開始を切り替え
  hide               トレイに最小化
  show               トレイから復元
  ok                 完了メッセージを閉じる
  status             現在の状態を表示
  help               このヘルプを表示
  quit               終了";

/// Parses one input line.
///
/// Returns `None` for blank lines and [`UiEvent::InputError`] for anything
/// unrecognised.
pub fn parse_command(line: &str) -> Option<UiEvent> {
    let mut words = line.split_whitespace();
    let command = words.next()?.to_lowercase();
    let args: Vec<&str> = words.collect();

    let event = match (command.as_str(), args.as_slice()) {
        ("start", []) => UiEvent::Start,
        ("pause" | "resume" | "p", []) => UiEvent::TogglePause,
        ("reset", []) => UiEvent::Reset,
        ("set", [focus, break_]) => UiEvent::ApplyDurations {
            focus: (*focus).to_string(),
            break_: (*break_).to_string(),
        },
        ("set", _) => usage("set <作業分> <休憩分>"),
        ("auto", [value]) => match value.to_lowercase().as_str() {
            "on" | "true" | "yes" => UiEvent::SetAutoStart(true),
            "off" | "false" | "no" => UiEvent::SetAutoStart(false),
            _ => usage("auto on|off"),
        },
        ("auto", _) => usage("auto on|off"),
        ("hide" | "minimize", []) => UiEvent::Minimize,
        ("show", []) => UiEvent::TrayShow,
        ("ok" | "dismiss", []) => UiEvent::DismissPopup,
        ("status", []) => UiEvent::Status,
        ("help" | "?", []) => UiEvent::Help,
        ("quit" | "exit" | "q", []) => UiEvent::Quit,
        _ => UiEvent::InputError(format!(
            "不明なコマンドです: {}（help で一覧を表示）",
            line.trim()
        )),
    };
    Some(event)
}

fn usage(text: &str) -> UiEvent {
    UiEvent::InputError(format!("使い方: {text}"))
}
