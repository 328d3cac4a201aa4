//! Persistent settings store.
//!
//! Settings are kept as a small JSON document:
//!
//! ```json
//! { "auto_start": true, "focus_time": 25, "break_time": 5 }
//! ```
//!
//! A missing or malformed file is never an error for the application: the
//! store falls back to defaults and only logs at debug level. Writes update
//! the in-memory copy first, so a failed save never loses the user's edit
//! for the current process.

mod error;

pub use error::ConfigError;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::types::Durations;

/// Directory name under the platform config dir.
const APP_DIR_NAME: &str = "pomodoro-tray";

/// Settings file name.
const SETTINGS_FILE_NAME: &str = "settings.json";

/// Fallback file used when no config dir can be determined.
const FALLBACK_SETTINGS_FILE: &str = "pomodoro_settings.json";

fn default_auto_start() -> bool {
    true
}

fn default_focus_time() -> u32 {
    Durations::default().focus_minutes
}

fn default_break_time() -> u32 {
    Durations::default().break_minutes
}

/// Persisted user settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Start the timer automatically when the session is unlocked.
    #[serde(default = "default_auto_start")]
    pub auto_start: bool,

    /// Focus length in minutes.
    #[serde(default = "default_focus_time")]
    pub focus_time: u32,

    /// Break length in minutes.
    #[serde(default = "default_break_time")]
    pub break_time: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_start: default_auto_start(),
            focus_time: default_focus_time(),
            break_time: default_break_time(),
        }
    }
}

impl Settings {
    /// Returns the validated durations, substituting defaults for any value
    /// that would not be accepted by [`Durations::new`].
    pub fn durations(&self) -> Durations {
        let defaults = Durations::default();
        let focus = if Durations::new(self.focus_time, defaults.break_minutes).is_ok() {
            self.focus_time
        } else {
            defaults.focus_minutes
        };
        let break_ = if Durations::new(defaults.focus_minutes, self.break_time).is_ok() {
            self.break_time
        } else {
            defaults.break_minutes
        };
        Durations {
            focus_minutes: focus,
            break_minutes: break_,
        }
    }

    fn sanitized(self) -> Self {
        let durations = self.durations();
        Self {
            auto_start: self.auto_start,
            focus_time: durations.focus_minutes,
            break_time: durations.break_minutes,
        }
    }

    /// Reads settings from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Settings =
            serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(settings.sanitized())
    }

    /// Writes settings to a JSON file, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Thread-safe settings store shared by the engine and the visibility
/// controller.
#[derive(Debug)]
pub struct ConfigStore {
    path: Option<PathBuf>,
    settings: RwLock<Settings>,
}

impl ConfigStore {
    /// Opens the store backed by `path`, falling back to defaults when the
    /// file is missing or malformed.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let settings = match Settings::load(&path) {
            Ok(settings) => {
                debug!(path = %path.display(), "設定を読み込みました");
                settings
            }
            Err(e) if e.is_not_found() => {
                debug!(path = %path.display(), "設定ファイルがないためデフォルト値を使用します");
                Settings::default()
            }
            Err(e) => {
                debug!(error = %e, "設定を読み込めないためデフォルト値を使用します");
                Settings::default()
            }
        };

        Self {
            path: Some(path),
            settings: RwLock::new(settings),
        }
    }

    /// Creates a store that never touches the filesystem.
    pub fn in_memory(settings: Settings) -> Self {
        Self {
            path: None,
            settings: RwLock::new(settings.sanitized()),
        }
    }

    /// Returns the default settings file location.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR_NAME).join(SETTINGS_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(FALLBACK_SETTINGS_FILE))
    }

    /// Returns the backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns a copy of the current settings.
    pub fn settings(&self) -> Settings {
        *self.settings.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the configured focus/break durations.
    pub fn durations(&self) -> Durations {
        self.settings().durations()
    }

    /// Returns the auto-start flag.
    pub fn auto_start(&self) -> bool {
        self.settings().auto_start
    }

    /// Updates and persists the auto-start flag.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails; the new value stays in effect.
    pub fn set_auto_start(&self, auto_start: bool) -> Result<(), ConfigError> {
        self.update(|settings| settings.auto_start = auto_start)
    }

    /// Updates and persists the focus/break durations.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails; the new values stay in effect.
    pub fn set_durations(&self, durations: Durations) -> Result<(), ConfigError> {
        self.update(|settings| {
            settings.focus_time = durations.focus_minutes;
            settings.break_time = durations.break_minutes;
        })
    }

    fn update(&self, apply: impl FnOnce(&mut Settings)) -> Result<(), ConfigError> {
        let snapshot = {
            let mut settings = self.settings.write().unwrap_or_else(PoisonError::into_inner);
            apply(&mut settings);
            *settings
        };

        match &self.path {
            Some(path) => {
                snapshot.save(path)?;
                info!(
                    path = %path.display(),
                    auto_start = snapshot.auto_start,
                    focus_time = snapshot.focus_time,
                    break_time = snapshot.break_time,
                    "設定を保存しました"
                );
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::in_memory(Settings::default())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod settings_tests {
        use super::*;

        #[test]
        fn test_default_settings() {
            let settings = Settings::default();
            assert!(settings.auto_start);
            assert_eq!(settings.focus_time, 25);
            assert_eq!(settings.break_time, 5);
        }

        #[test]
        fn test_deserialize_partial() {
            let settings: Settings = serde_json::from_str(r#"{"auto_start": false}"#).unwrap();
            assert!(!settings.auto_start);
            assert_eq!(settings.focus_time, 25);
            assert_eq!(settings.break_time, 5);
        }

        #[test]
        fn test_serialized_field_names() {
            let json = serde_json::to_value(Settings::default()).unwrap();
            assert_eq!(json["auto_start"], true);
            assert_eq!(json["focus_time"], 25);
            assert_eq!(json["break_time"], 5);
        }

        #[test]
        fn test_zero_durations_fall_back() {
            let settings = Settings {
                auto_start: true,
                focus_time: 0,
                break_time: 7,
            };
            let durations = settings.durations();
            assert_eq!(durations.focus_minutes, 25);
            assert_eq!(durations.break_minutes, 7);
        }

        #[test]
        fn test_save_and_load() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("nested").join("settings.json");
            let settings = Settings {
                auto_start: false,
                focus_time: 50,
                break_time: 10,
            };

            settings.save(&path).unwrap();
            assert_eq!(Settings::load(&path).unwrap(), settings);
        }
    }

    mod store_tests {
        use super::*;

        #[test]
        fn test_open_missing_file_uses_defaults() {
            let dir = tempfile::tempdir().unwrap();
            let store = ConfigStore::open(dir.path().join("missing.json"));
            assert_eq!(store.settings(), Settings::default());
        }

        #[test]
        fn test_open_malformed_file_uses_defaults() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("settings.json");
            fs::write(&path, "{ not json").unwrap();

            let store = ConfigStore::open(&path);
            assert_eq!(store.settings(), Settings::default());
        }

        #[test]
        fn test_open_negative_value_uses_defaults() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("settings.json");
            fs::write(&path, r#"{"focus_time": -5}"#).unwrap();

            let store = ConfigStore::open(&path);
            assert_eq!(store.durations(), Durations::default());
        }

        #[test]
        fn test_set_durations_persists() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("settings.json");
            let store = ConfigStore::open(&path);

            store.set_durations(Durations::new(40, 8).unwrap()).unwrap();
            assert_eq!(store.durations(), Durations::new(40, 8).unwrap());

            let reopened = ConfigStore::open(&path);
            assert_eq!(reopened.durations(), Durations::new(40, 8).unwrap());
        }

        #[test]
        fn test_set_auto_start_persists() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("settings.json");
            let store = ConfigStore::open(&path);

            store.set_auto_start(false).unwrap();
            assert!(!store.auto_start());
            assert!(!ConfigStore::open(&path).auto_start());
        }

        #[test]
        fn test_failed_save_keeps_value_in_memory() {
            let dir = tempfile::tempdir().unwrap();
            // A directory where the file should be makes the write fail.
            let path = dir.path().join("settings.json");
            fs::create_dir_all(&path).unwrap();
            let store = ConfigStore::open(&path);

            let result = store.set_auto_start(false);
            assert!(result.is_err());
            assert!(!store.auto_start());
        }

        #[test]
        fn test_in_memory_has_no_path() {
            let store = ConfigStore::in_memory(Settings::default());
            assert!(store.path().is_none());
            store.set_auto_start(false).unwrap();
            assert!(!store.auto_start());
        }

        #[test]
        fn test_default_path_file_name() {
            let path = ConfigStore::default_path();
            assert!(path.to_string_lossy().ends_with(".json"));
        }
    }
}
