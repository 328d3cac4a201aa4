//! Sound playback using rodio.
//!
//! `RodioSoundPlayer` owns the audio output stream, which must stay on the
//! thread that created it. `SoundWorker` gives the rest of the application a
//! `Send + Sync` handle: it runs a dedicated audio thread that owns the
//! player and receives play requests over a channel.

use std::fs::File;
use std::io::BufReader;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};
use rodio::source::SineWave;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use tracing::{debug, warn};

use super::error::SoundError;
use super::source::SoundSource;
use super::SoundPlayer;

/// Pitch of the synthesized bell.
const BELL_FREQUENCY_HZ: f32 = 880.0;

/// Length of the synthesized bell.
const BELL_DURATION: Duration = Duration::from_millis(300);

/// Volume of the synthesized bell.
const BELL_VOLUME: f32 = 0.2;

/// A sound player that uses rodio for audio playback.
///
/// Playback is non-blocking; sounds continue in the background for as long
/// as the player is alive.
pub struct RodioSoundPlayer {
    /// The audio output stream (must be kept alive for playback).
    _stream: OutputStream,
    /// Handle to the output stream for creating sinks.
    stream_handle: OutputStreamHandle,
}

impl RodioSoundPlayer {
    /// Opens the default audio output device.
    ///
    /// # Errors
    ///
    /// Returns `SoundError::DeviceNotAvailable` if no audio output device
    /// is available.
    pub fn new() -> Result<Self, SoundError> {
        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| SoundError::DeviceNotAvailable(e.to_string()))?;

        debug!("Audio output stream initialized");

        Ok(Self {
            _stream: stream,
            stream_handle,
        })
    }

    /// Plays a sound from the given source.
    ///
    /// A sound file that cannot be opened or decoded falls back to the bell.
    ///
    /// # Errors
    ///
    /// Returns an error if no sink can be created on the output stream.
    pub fn play(&self, source: &SoundSource) -> Result<(), SoundError> {
        match source {
            SoundSource::File { path, name } => {
                debug!("Playing sound file: {}", name);
                match self.play_file(path) {
                    Ok(()) => Ok(()),
                    Err(e) if e.is_file_error() => {
                        warn!("Failed to play sound '{}': {}, falling back to bell", name, e);
                        self.play_bell()
                    }
                    Err(e) => Err(e),
                }
            }
            SoundSource::Bell => self.play_bell(),
        }
    }

    fn play_file(&self, path: &std::path::Path) -> Result<(), SoundError> {
        let file = File::open(path)
            .map_err(|e| SoundError::FileNotFound(format!("{}: {}", path.display(), e)))?;

        let decoder = Decoder::new(BufReader::new(file))
            .map_err(|e| SoundError::DecodeError(e.to_string()))?;

        let sink = self.new_sink()?;
        sink.append(decoder);
        sink.detach();
        Ok(())
    }

    fn play_bell(&self) -> Result<(), SoundError> {
        let tone = SineWave::new(BELL_FREQUENCY_HZ)
            .take_duration(BELL_DURATION)
            .amplify(BELL_VOLUME);

        let sink = self.new_sink()?;
        sink.append(tone);
        sink.detach();
        Ok(())
    }

    fn new_sink(&self) -> Result<Sink, SoundError> {
        Sink::try_new(&self.stream_handle).map_err(|e| SoundError::StreamError(e.to_string()))
    }
}

impl std::fmt::Debug for RodioSoundPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodioSoundPlayer").finish_non_exhaustive()
    }
}

// ============================================================================
// SoundWorker
// ============================================================================

/// Handle to the dedicated audio thread.
#[derive(Debug)]
pub struct SoundWorker {
    tx: Sender<SoundSource>,
    disabled: AtomicBool,
}

impl SoundWorker {
    /// Spawns the audio thread.
    ///
    /// The output device is opened on the new thread; if that fails the
    /// worker keeps accepting requests and drops them with a log line.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn spawn(disabled: bool) -> Result<Self, SoundError> {
        let (tx, rx) = unbounded();

        thread::Builder::new()
            .name("sound".to_string())
            .spawn(move || run_worker(rx))
            .map_err(|e| SoundError::PlaybackError(e.to_string()))?;

        Ok(Self {
            tx,
            disabled: AtomicBool::new(disabled),
        })
    }
}

fn run_worker(rx: Receiver<SoundSource>) {
    let player = match RodioSoundPlayer::new() {
        Ok(player) => Some(player),
        Err(e) => {
            warn!("Audio not available, sound disabled: {}", e);
            None
        }
    };

    match player {
        Some(player) => serve_requests(&rx, |source| player.play(source)),
        None => {
            for source in rx.iter() {
                debug!("No audio device, skipping sound '{}'", source.name());
            }
        }
    }

    debug!("Sound worker stopped");
}

/// Plays requests until every sender is gone.
///
/// After a device error the remaining requests are dropped; the output
/// stream does not come back on its own.
fn serve_requests<F>(rx: &Receiver<SoundSource>, mut play: F)
where
    F: FnMut(&SoundSource) -> Result<(), SoundError>,
{
    let mut device_lost = false;

    for source in rx.iter() {
        if device_lost {
            debug!("Audio device lost, skipping sound '{}'", source.name());
            continue;
        }
        match play(&source) {
            Ok(()) => {}
            Err(e) if e.is_device_error() => {
                warn!("Audio device lost, sound disabled: {}", e);
                device_lost = true;
            }
            Err(e) => warn!("Sound playback failed: {}", e),
        }
    }
}

impl SoundPlayer for SoundWorker {
    fn play(&self, source: &SoundSource) -> Result<(), SoundError> {
        if self.is_disabled() {
            debug!("Sound playback disabled, skipping");
            return Ok(());
        }
        self.tx
            .send(source.clone())
            .map_err(|_| SoundError::PlaybackError("sound worker stopped".to_string()))
    }

    fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Relaxed)
    }

    fn enable(&self) {
        self.disabled.store(false, Ordering::Relaxed);
        debug!("Sound playback enabled");
    }

    fn disable(&self) {
        self.disabled.store(true, Ordering::Relaxed);
        debug!("Sound playback disabled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Note: the audio device may be missing (e.g. CI containers); the worker
    // must behave the same either way.

    #[test]
    fn test_worker_accepts_requests_without_device() {
        let worker = SoundWorker::spawn(false).unwrap();
        assert!(!worker.is_disabled());
        assert!(worker.play(&SoundSource::Bell).is_ok());
    }

    #[test]
    fn test_worker_enable_disable() {
        let worker = SoundWorker::spawn(true).unwrap();
        assert!(worker.is_disabled());
        assert!(worker.play(&SoundSource::Bell).is_ok());

        worker.enable();
        assert!(!worker.is_disabled());

        worker.disable();
        assert!(worker.is_disabled());
    }

    #[test]
    fn test_player_nonexistent_file_falls_back() {
        let player = match RodioSoundPlayer::new() {
            Ok(p) => p,
            Err(_) => return,
        };

        let source = SoundSource::file("NonExistent", "/nonexistent/path/to/sound.wav");
        assert!(player.play(&source).is_ok());
    }

    #[test]
    fn test_device_error_stops_playback() {
        let (tx, rx) = unbounded();
        for _ in 0..3 {
            tx.send(SoundSource::Bell).unwrap();
        }
        drop(tx);

        let mut attempts = 0;
        serve_requests(&rx, |_| {
            attempts += 1;
            Err(SoundError::StreamError("device unplugged".to_string()))
        });

        assert_eq!(attempts, 1);
    }

    #[test]
    fn test_file_error_keeps_playing() {
        let (tx, rx) = unbounded();
        for _ in 0..3 {
            tx.send(SoundSource::Bell).unwrap();
        }
        drop(tx);

        let mut attempts = 0;
        serve_requests(&rx, |_| {
            attempts += 1;
            Err(SoundError::DecodeError("bad header".to_string()))
        });

        assert_eq!(attempts, 3);
    }

    #[test]
    fn test_debug_impl() {
        let worker = SoundWorker::spawn(true).unwrap();
        assert!(format!("{:?}", worker).contains("SoundWorker"));
    }
}
