//! Pomodoro Timer Library
//!
//! This library provides the core functionality for the Pomodoro Timer:
//! - Session engine alternating focus and break phases on a countdown thread
//! - Visibility controller for the window / tray lifecycle
//! - Unlock monitor that can auto-start the timer
//! - Desktop notifications with an alert sound
//! - JSON settings store
//! - Console UI loop and CLI

pub mod app;
pub mod cli;
pub mod config;
pub mod display;
pub mod menubar;
pub mod monitor;
pub mod notification;
pub mod session;
pub mod sound;
pub mod types;
pub mod visibility;

// Re-export commonly used types for convenience
pub use types::{
    ControlState, DisplayUpdate, DurationError, Durations, Phase, SessionState, UiEvent,
    VisibilityState,
};

pub use config::{ConfigError, ConfigStore, Settings};
pub use display::{Display, RecordingDisplay, UiDisplay};
pub use session::SessionEngine;
pub use visibility::{MockWindow, VisibilityController, Window, WindowError};

pub use menubar::{
    EventHandler, HeadlessTrayFactory, IconManager, MenuAction, MenuBuilder, MenuConfig,
    MenuItemId, MockTrayFactory, TrayError, TrayFactory, TrayHandle, TrayView,
};

pub use monitor::{LockProbe, MockLockProbe, MonitorError, MonitorHandle, UnlockMonitor};

pub use notification::{DesktopNotifier, MockNotifier, NotificationError, NotificationPort};

pub use sound::{
    discover_system_sounds, get_default_sound, MockSoundPlayer, RodioSoundPlayer, SoundError,
    SoundPlayer, SoundSource, SoundWorker,
};
