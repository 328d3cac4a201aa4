//! Alert and popup texts shown when a phase completes.

use crate::types::{Durations, Phase};

/// Seconds before the phase-complete popup closes by itself.
pub const POPUP_AUTO_DISMISS_SECS: u64 = 5;

/// Title and body of a completion notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseAlert {
    /// Notification title
    pub title: String,
    /// Notification body
    pub message: String,
}

/// Builds the notification for the end of `finished`.
///
/// The text announces the phase that starts next, using its configured
/// length.
pub fn completion_alert(finished: Phase, durations: &Durations) -> PhaseAlert {
    match finished {
        Phase::Focus => PhaseAlert {
            title: "休憩時間です！".to_string(),
            message: format!("{}分間の休憩を取りましょう。", durations.break_minutes),
        },
        Phase::Break => PhaseAlert {
            title: "作業に戻りましょう！".to_string(),
            message: format!(
                "休憩終了です。{}分間集中しましょう。",
                durations.focus_minutes
            ),
        },
    }
}

/// Builds the on-screen popup text for the end of `finished`.
pub fn completion_popup(finished: Phase, durations: &Durations) -> String {
    match finished {
        Phase::Focus => format!(
            "お疲れさまでした！{}分間の休憩を取りましょう。",
            durations.break_minutes
        ),
        Phase::Break => format!(
            "休憩時間は終わりです。{}分間集中しましょう。",
            durations.focus_minutes
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_focus_complete_mentions_break_length() {
        let durations = Durations::new(50, 10).unwrap();
        let alert = completion_alert(Phase::Focus, &durations);
        assert_eq!(alert.title, "休憩時間です！");
        assert!(alert.message.contains("10分"));
        assert!(completion_popup(Phase::Focus, &durations).contains("10分"));
    }

    #[test]
    fn test_break_complete_mentions_focus_length() {
        let durations = Durations::new(50, 10).unwrap();
        let alert = completion_alert(Phase::Break, &durations);
        assert_eq!(alert.title, "作業に戻りましょう！");
        assert!(alert.message.contains("50分"));
        assert!(completion_popup(Phase::Break, &durations).contains("50分"));
    }
}
