//! Sound source selection.
//!
//! Completion alerts prefer a short sound shipped with the desktop
//! environment and fall back to a synthesized bell when none is installed.

use std::path::{Path, PathBuf};

use super::error::SoundError;

/// Represents the source of a sound to be played.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoundSource {
    /// A sound file installed on the system.
    File {
        /// The name of the sound (file stem, e.g. "complete").
        name: String,
        /// The full path to the sound file.
        path: PathBuf,
    },
    /// A short synthesized tone, always available.
    Bell,
}

impl SoundSource {
    /// Creates a new file sound source.
    #[must_use]
    pub fn file(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::File {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Returns the name of the sound source.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::File { name, .. } => name,
            Self::Bell => "bell",
        }
    }

    /// Returns true if this is a sound file.
    #[must_use]
    pub fn is_file(&self) -> bool {
        matches!(self, Self::File { .. })
    }

    /// Returns the file path if this is a sound file.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File { path, .. } => Some(path),
            Self::Bell => None,
        }
    }
}

/// Directories to search for system sounds, in order of priority.
#[cfg(target_os = "macos")]
const SYSTEM_SOUND_DIRS: &[&str] = &["/System/Library/Sounds", "/Library/Sounds"];

#[cfg(target_os = "windows")]
const SYSTEM_SOUND_DIRS: &[&str] = &["C:\\Windows\\Media"];

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const SYSTEM_SOUND_DIRS: &[&str] = &[
    "/usr/share/sounds/freedesktop/stereo",
    "/usr/share/sounds/gnome/default/alerts",
    "/usr/share/sounds",
];

/// Supported audio file extensions.
const SUPPORTED_EXTENSIONS: &[&str] = &["oga", "ogg", "wav", "flac", "mp3"];

/// Default sound names to try, in order of preference.
const DEFAULT_SOUND_NAMES: &[&str] = &["complete", "bell", "Glass", "Ping", "Windows Notify"];

/// Discovers available system sounds.
///
/// Returns an empty vector if no sound directory exists.
#[must_use]
pub fn discover_system_sounds() -> Vec<SoundSource> {
    let mut sounds: Vec<SoundSource> = SYSTEM_SOUND_DIRS
        .iter()
        .map(PathBuf::from)
        .filter(|dir| dir.is_dir())
        .filter_map(|dir| std::fs::read_dir(dir).ok())
        .flat_map(|entries| entries.flatten())
        .map(|entry| entry.path())
        .filter(|path| has_supported_extension(path))
        .filter_map(|path| {
            let name = path.file_stem()?.to_string_lossy().into_owned();
            Some(SoundSource::File { name, path })
        })
        .collect();

    sounds.sort_by(|a, b| a.name().cmp(b.name()));
    sounds
}

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}

/// Gets the default sound source for completion alerts.
#[must_use]
pub fn get_default_sound() -> SoundSource {
    let system_sounds = discover_system_sounds();

    for preferred_name in DEFAULT_SOUND_NAMES {
        if let Some(sound) = system_sounds.iter().find(|s| s.name() == *preferred_name) {
            return sound.clone();
        }
    }

    SoundSource::Bell
}

/// Finds a system sound by name.
///
/// # Errors
///
/// Returns `SoundError::FileNotFound` if no sound with the given name exists.
pub fn find_system_sound(name: &str) -> Result<SoundSource, SoundError> {
    discover_system_sounds()
        .into_iter()
        .find(|s| s.name().eq_ignore_ascii_case(name))
        .ok_or_else(|| SoundError::FileNotFound(format!("システムサウンド '{}'", name)))
}
