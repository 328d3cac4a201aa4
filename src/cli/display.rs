//! Output formatting for one-shot CLI commands.

use std::path::Path;

use crate::config::Settings;

/// Output utilities for CLI commands.
pub struct Output;

impl Output {
    /// Formats saved settings.
    pub fn format_settings(settings: &Settings, path: Option<&Path>) -> String {
        let mut lines = vec![
            "ポモドーロタイマー 設定".to_string(),
            "─────────────────────────────".to_string(),
            format!("作業時間: {}分", settings.focus_time),
            format!("休憩時間: {}分", settings.break_time),
            format!(
                "自動開始: {}",
                if settings.auto_start { "オン" } else { "オフ" }
            ),
        ];
        if let Some(path) = path {
            lines.push(format!("ファイル: {}", path.display()));
        }
        lines.join("\n")
    }

    /// Shows saved settings.
    pub fn show_settings(settings: &Settings, path: Option<&Path>) {
        println!("{}", Self::format_settings(settings, path));
    }

    /// Shows a confirmation after settings were saved.
    pub fn show_saved() {
        println!("* 設定を保存しました");
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("エラー: {}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_settings() {
        let text = Output::format_settings(&Settings::default(), Some(Path::new("/tmp/s.json")));
        assert!(text.contains("作業時間: 25分"));
        assert!(text.contains("休憩時間: 5分"));
        assert!(text.contains("自動開始: オン"));
        assert!(text.contains("/tmp/s.json"));
    }

    #[test]
    fn test_format_settings_without_path() {
        let settings = Settings {
            auto_start: false,
            ..Settings::default()
        };
        let text = Output::format_settings(&settings, None);
        assert!(text.contains("自動開始: オフ"));
        assert!(!text.contains("ファイル"));
    }
}
