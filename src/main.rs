//! Pomodoro Timer - focus/break cycles with a tray mode
//!
//! This tool helps you stay focused using the Pomodoro Technique:
//! - 25 minutes of focused work
//! - 5 minutes of break
//! - repeated until you reset or quit

use clap::Parser;

use pomodoro_tray::cli::{execute, Cli, Output};

fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    if let Err(e) = execute(cli) {
        Output::show_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
///
/// `RUST_LOG` wins; otherwise `warn`, or `debug` with `--verbose`.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}
