//! Focus/break session state machine.
//!
//! ```text
//!            start()                 toggle_pause()
//!   Idle ─────────────▶ Running ◀──────────────────▶ Paused
//!    ▲                    │  │                          │
//!    │     reset()/stop() │  │ remaining == 0           │
//!    └────────────────────┘  ▼                          │
//!                  notify → popup → flip phase → Running (new thread)
//! ```

mod engine;
mod messages;

pub use engine::{SessionEngine, DEFAULT_TICK};
pub use messages::{completion_alert, completion_popup, PhaseAlert, POPUP_AUTO_DISMISS_SECS};
