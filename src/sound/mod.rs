//! Sound playback system for the Pomodoro Timer.
//!
//! This module provides the audible part of a completion alert:
//!
//! - System sound discovery with a synthesized bell fallback
//! - Non-blocking playback on a dedicated audio thread
//! - Graceful degradation when audio is unavailable
//!
//! # Architecture
//!
//! ```text
//! countdown thread ──play()──▶ SoundWorker ──channel──▶ audio thread
//!                                                        │
//!                                                        ▼
//!                                               RodioSoundPlayer
//!                                            (sound file or bell)
//! ```

mod error;
mod player;
mod source;

pub use error::SoundError;
pub use player::{RodioSoundPlayer, SoundWorker};
pub use source::{discover_system_sounds, find_system_sound, get_default_sound, SoundSource};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

/// Trait for sound playback implementations.
pub trait SoundPlayer: Send + Sync {
    /// Plays a sound from the given source without blocking.
    ///
    /// # Errors
    ///
    /// Returns an error if playback could not be scheduled.
    fn play(&self, source: &SoundSource) -> Result<(), SoundError>;

    /// Returns true if sound playback is disabled.
    fn is_disabled(&self) -> bool;

    /// Enables sound playback.
    fn enable(&self);

    /// Disables sound playback.
    fn disable(&self);
}

/// Mock sound player for testing.
#[derive(Debug, Default)]
pub struct MockSoundPlayer {
    play_calls: Mutex<Vec<SoundSource>>,
    disabled: AtomicBool,
    should_fail: AtomicBool,
}

impl MockSoundPlayer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn play_count(&self) -> usize {
        self.calls().len()
    }

    #[must_use]
    pub fn get_play_calls(&self) -> Vec<SoundSource> {
        self.calls().clone()
    }

    fn calls(&self) -> std::sync::MutexGuard<'_, Vec<SoundSource>> {
        self.play_calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SoundPlayer for MockSoundPlayer {
    fn play(&self, source: &SoundSource) -> Result<(), SoundError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(SoundError::PlaybackError("Mock failure".to_string()));
        }
        if self.disabled.load(Ordering::SeqCst) {
            return Ok(());
        }
        self.calls().push(source.clone());
        Ok(())
    }

    fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::SeqCst)
    }

    fn enable(&self) {
        self.disabled.store(false, Ordering::SeqCst);
    }

    fn disable(&self) {
        self.disabled.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_records_calls() {
        let player = MockSoundPlayer::new();
        player.play(&SoundSource::Bell).unwrap();
        player
            .play(&SoundSource::file("complete", "/tmp/complete.oga"))
            .unwrap();

        assert_eq!(player.play_count(), 2);
        assert_eq!(player.get_play_calls()[0], SoundSource::Bell);
    }

    #[test]
    fn test_mock_disabled_skips() {
        let player = MockSoundPlayer::new();
        player.disable();
        player.play(&SoundSource::Bell).unwrap();
        assert_eq!(player.play_count(), 0);

        player.enable();
        player.play(&SoundSource::Bell).unwrap();
        assert_eq!(player.play_count(), 1);
    }

    #[test]
    fn test_mock_failure() {
        let player = MockSoundPlayer::new();
        player.set_should_fail(true);
        assert!(player.play(&SoundSource::Bell).is_err());
    }
}
