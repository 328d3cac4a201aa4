//! CLI module for the Pomodoro Timer.
//!
//! - `commands`: Command definitions using clap derive
//! - `display`: Output formatting for one-shot commands

pub mod commands;
pub mod display;

pub use commands::{Cli, Commands, ConfigArgs, RunArgs};
pub use display::Output;

use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use clap::CommandFactory;

use crate::app::launch;
use crate::config::{ConfigStore, Settings};
use crate::types::Durations;

/// Executes the CLI command.
///
/// # Errors
///
/// Returns an error if the command fails.
pub fn execute(cli: Cli) -> Result<()> {
    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }
    let config_path = cli.config_path();

    match cli.command {
        Some(Commands::Run(args)) => launch(args.into_options(config_path)),
        None => launch(RunArgs::default().into_options(config_path)),
        Some(Commands::Config(args)) => {
            let settings = apply_config(&config_path, &args)?;
            if args.has_edits() {
                Output::show_saved();
            }
            Output::show_settings(&settings, Some(&config_path));
            Ok(())
        }
        Some(Commands::Completions { shell }) => {
            generate_completions(shell);
            Ok(())
        }
    }
}

/// Applies `config` edits to the settings file and returns the result.
///
/// Durations go through the same validation as window edits; a missing
/// value keeps its saved setting.
///
/// # Errors
///
/// Returns an error if a duration is invalid or the file cannot be written.
pub fn apply_config(path: &Path, args: &ConfigArgs) -> Result<Settings> {
    let store = ConfigStore::open(path);

    if args.focus.is_some() || args.break_.is_some() {
        let current = store.durations();
        let focus = args
            .focus
            .clone()
            .unwrap_or_else(|| current.focus_minutes.to_string());
        let break_ = args
            .break_
            .clone()
            .unwrap_or_else(|| current.break_minutes.to_string());

        let durations = Durations::parse(&focus, &break_)?;
        store
            .set_durations(durations)
            .context("設定を保存できませんでした")?;
    }

    if let Some(auto_start) = args.auto_start {
        store
            .set_auto_start(auto_start)
            .context("設定を保存できませんでした")?;
    }

    Ok(store.settings())
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args(focus: Option<&str>, break_: Option<&str>, auto_start: Option<bool>) -> ConfigArgs {
        ConfigArgs {
            focus: focus.map(str::to_string),
            break_: break_.map(str::to_string),
            auto_start,
        }
    }

    #[test]
    fn test_apply_config_shows_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");

        let settings = apply_config(&path, &ConfigArgs::default()).unwrap();

        assert_eq!(settings, Settings::default());
        assert!(!path.exists());
    }

    #[test]
    fn test_apply_config_partial_edit() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");

        let settings = apply_config(&path, &args(Some("45"), None, Some(false))).unwrap();

        assert_eq!(settings.focus_time, 45);
        assert_eq!(settings.break_time, 5);
        assert!(!settings.auto_start);
        assert_eq!(Settings::load(&path).unwrap(), settings);
    }

    #[test]
    fn test_apply_config_rejects_invalid() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        apply_config(&path, &args(Some("30"), Some("10"), None)).unwrap();

        let result = apply_config(&path, &args(Some("-5"), None, None));

        assert!(result.is_err());
        let saved = Settings::load(&path).unwrap();
        assert_eq!(saved.focus_time, 30);
        assert_eq!(saved.break_time, 10);
    }
}
