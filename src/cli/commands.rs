//! Command definitions for the Pomodoro Timer CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::app::AppOptions;
use crate::config::ConfigStore;
use crate::monitor::DEFAULT_POLL_INTERVAL;

// ============================================================================
// CLI Structure
// ============================================================================

/// Pomodoro Timer - focus/break cycles with tray mode and auto-start on unlock
#[derive(Parser, Debug)]
#[command(
    name = "pomodoro-tray",
    version,
    about = "トレイ常駐型ポモドーロタイマー",
    long_about = "作業と休憩を交互に繰り返すポモドーロタイマー。\n\
                  トレイへの最小化、デスクトップ通知、ロック解除時の自動開始に対応しています。",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute (defaults to `run`)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Settings file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Returns the settings file to use.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(ConfigStore::default_path)
    }
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Open the timer window
    Run(RunArgs),

    /// Show or edit saved settings
    Config(ConfigArgs),

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ============================================================================
// Run Command Arguments
// ============================================================================

/// Arguments for the run command
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Start hidden in the tray
    #[arg(short, long)]
    pub minimized: bool,

    /// Disable notification sounds
    #[arg(long)]
    pub no_sound: bool,

    /// Disable desktop toasts
    #[arg(long)]
    pub no_toast: bool,

    /// Do not watch for session unlocks
    #[arg(long)]
    pub no_unlock_monitor: bool,

    /// Unlock polling interval in seconds (1-3600)
    #[arg(
        long,
        value_name = "SECS",
        default_value_t = DEFAULT_POLL_INTERVAL.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..=3600)
    )]
    pub poll_interval: u64,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            minimized: false,
            no_sound: false,
            no_toast: false,
            no_unlock_monitor: false,
            poll_interval: DEFAULT_POLL_INTERVAL.as_secs(),
        }
    }
}

impl RunArgs {
    /// Converts the arguments into launch options.
    pub fn into_options(self, config_path: PathBuf) -> AppOptions {
        AppOptions {
            config_path,
            start_minimized: self.minimized,
            sound: !self.no_sound,
            toast: !self.no_toast,
            unlock_monitor: !self.no_unlock_monitor,
            poll_interval: Duration::from_secs(self.poll_interval),
        }
    }
}

// ============================================================================
// Config Command Arguments
// ============================================================================

/// Arguments for the config command
///
/// Durations are taken as text so they go through the same validation as
/// edits made in the window.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Focus duration in minutes
    #[arg(short, long, value_name = "MINUTES", allow_hyphen_values = true)]
    pub focus: Option<String>,

    /// Break duration in minutes
    #[arg(short, long = "break", value_name = "MINUTES", allow_hyphen_values = true)]
    pub break_: Option<String>,

    /// Start the timer automatically when the session is unlocked
    #[arg(short, long, value_name = "BOOL")]
    pub auto_start: Option<bool>,
}

impl ConfigArgs {
    /// Returns true if any edit was requested.
    pub fn has_edits(&self) -> bool {
        self.focus.is_some() || self.break_.is_some() || self.auto_start.is_some()
    }
}

// ============================================================================
// Tests
// ============================================================================
