//! Process signals and terminal input, turned into UI events.

use std::io::{self, BufRead};
use std::thread;

use crossbeam_channel::Sender;
use tracing::{debug, info, warn};

use super::command::parse_command;
use crate::types::UiEvent;

/// Spawns a thread that posts [`UiEvent::Quit`] on SIGINT or SIGTERM.
///
/// # Errors
///
/// Returns an error if the thread cannot be spawned.
pub fn spawn_signal_listener(events: Sender<UiEvent>) -> io::Result<()> {
    thread::Builder::new()
        .name("signals".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    warn!(error = %e, "シグナル監視を開始できませんでした");
                    return;
                }
            };

            match runtime.block_on(wait_for_shutdown_signal()) {
                Ok(signal) => {
                    info!(signal, "終了シグナルを受信しました");
                    let _ = events.send(UiEvent::Quit);
                }
                Err(e) => warn!(error = %e, "シグナル監視に失敗しました"),
            }
        })?;
    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() -> io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result.map(|()| "SIGINT"),
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> io::Result<&'static str> {
    tokio::signal::ctrl_c().await.map(|()| "Ctrl-C")
}

/// Spawns a thread that parses stdin lines into UI events.
///
/// End of input only ends this thread; the app keeps running.
///
/// # Errors
///
/// Returns an error if the thread cannot be spawned.
pub fn spawn_input_reader(events: Sender<UiEvent>) -> io::Result<()> {
    thread::Builder::new()
        .name("stdin".to_string())
        .spawn(move || {
            let stdin = io::stdin();
            forward_lines(stdin.lock(), &events);
            debug!("標準入力が閉じられました");
        })?;
    Ok(())
}

/// Forwards parsed lines until EOF, a read error, or a closed queue.
fn forward_lines(input: impl BufRead, events: &Sender<UiEvent>) {
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "標準入力を読み込めませんでした");
                break;
            }
        };
        if let Some(event) = parse_command(&line) {
            if events.send(event).is_err() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn test_forward_lines() {
        let (tx, rx) = unbounded();
        let input = io::Cursor::new("start\n\nset 30 5\nbogus\n");

        forward_lines(input, &tx);

        let events: Vec<UiEvent> = rx.try_iter().collect();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], UiEvent::Start);
        assert!(matches!(events[1], UiEvent::ApplyDurations { .. }));
        assert!(matches!(events[2], UiEvent::InputError(_)));
    }

    #[test]
    fn test_forward_stops_on_closed_queue() {
        let (tx, rx) = unbounded();
        drop(rx);
        forward_lines(io::Cursor::new("start\nreset\n"), &tx);
    }
}
