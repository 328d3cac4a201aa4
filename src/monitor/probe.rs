//! Session lock probes.
//!
//! Each probe answers one question: is the user session locked right now?

use std::collections::VecDeque;
use std::process::Command;
use std::sync::{Arc, Mutex, PoisonError};

use super::error::MonitorError;

/// Source of the current lock state.
pub trait LockProbe: Send + 'static {
    /// Returns true if the session is currently locked.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock state cannot be determined.
    fn is_locked(&self) -> Result<bool, MonitorError>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Returns the probe for this platform.
pub fn default_probe() -> Box<dyn LockProbe> {
    if cfg!(target_os = "linux") {
        Box::new(LoginctlProbe::current_session())
    } else if cfg!(target_os = "macos") {
        Box::new(IoregProbe)
    } else {
        Box::new(NullProbe)
    }
}

/// Runs a probe command and returns its stdout.
fn run_probe_command(program: &str, args: &[&str]) -> Result<String, MonitorError> {
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| MonitorError::CommandExecution(format!("{program}: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(MonitorError::ProbeFailed(stderr.trim().to_string()));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

// ============================================================================
// LoginctlProbe
// ============================================================================

/// Reads `LockedHint` of a logind session.
#[derive(Debug, Clone)]
pub struct LoginctlProbe {
    session: String,
}

impl LoginctlProbe {
    pub fn new(session: impl Into<String>) -> Self {
        Self {
            session: session.into(),
        }
    }

    /// Probe for the session this process runs in (`$XDG_SESSION_ID`, or
    /// logind's `self` alias).
    pub fn current_session() -> Self {
        let session = std::env::var("XDG_SESSION_ID")
            .ok()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| "self".to_string());
        Self::new(session)
    }

    pub fn session(&self) -> &str {
        &self.session
    }
}

/// Parses `loginctl show-session -p LockedHint --value` output.
pub fn parse_locked_hint(output: &str) -> Result<bool, MonitorError> {
    let value = output.trim();
    let value = value.strip_prefix("LockedHint=").unwrap_or(value);
    match value {
        "yes" => Ok(true),
        "no" => Ok(false),
        other => Err(MonitorError::UnexpectedOutput(other.to_string())),
    }
}

impl LockProbe for LoginctlProbe {
    fn is_locked(&self) -> Result<bool, MonitorError> {
        let output = run_probe_command(
            "loginctl",
            &["show-session", &self.session, "-p", "LockedHint", "--value"],
        )?;
        parse_locked_hint(&output)
    }

    fn name(&self) -> &'static str {
        "loginctl"
    }
}

// ============================================================================
// IoregProbe
// ============================================================================

/// Reads `CGSSessionScreenIsLocked` from the IORegistry root (macOS).
#[derive(Debug, Clone, Copy, Default)]
pub struct IoregProbe;

const IOREG_LOCKED_KEY: &str = "\"CGSSessionScreenIsLocked\"=Yes";

/// Returns true if `ioreg -n Root -d1` output reports a locked screen.
pub fn parse_ioreg(output: &str) -> bool {
    output.contains(IOREG_LOCKED_KEY)
}

impl LockProbe for IoregProbe {
    fn is_locked(&self) -> Result<bool, MonitorError> {
        let output = run_probe_command("ioreg", &["-n", "Root", "-d1"])?;
        Ok(parse_ioreg(&output))
    }

    fn name(&self) -> &'static str {
        "ioreg"
    }
}

// ============================================================================
// NullProbe
// ============================================================================

/// Never reports a lock, so the monitor never fires.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProbe;

impl LockProbe for NullProbe {
    fn is_locked(&self) -> Result<bool, MonitorError> {
        Ok(false)
    }

    fn name(&self) -> &'static str {
        "null"
    }
}

// ============================================================================
// MockLockProbe
// ============================================================================

#[derive(Debug, Default)]
struct MockProbeState {
    script: VecDeque<Result<bool, String>>,
    last: bool,
    calls: usize,
}

/// Probe returning scripted results, for tests.
///
/// Once the script runs out the last successful value repeats. Clones share
/// the script.
#[derive(Debug, Clone, Default)]
pub struct MockLockProbe {
    state: Arc<Mutex<MockProbeState>>,
}

impl MockLockProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a probe that returns `states` in order.
    pub fn with_states(states: &[bool]) -> Self {
        let probe = Self::new();
        for &locked in states {
            probe.push(locked);
        }
        probe
    }

    /// Appends a successful observation.
    pub fn push(&self, locked: bool) {
        self.lock().script.push_back(Ok(locked));
    }

    /// Appends a probe failure.
    pub fn push_error(&self, reason: &str) {
        self.lock().script.push_back(Err(reason.to_string()));
    }

    /// Number of times the probe has been queried.
    pub fn calls(&self) -> usize {
        self.lock().calls
    }

    /// Returns true once every scripted result has been consumed.
    pub fn is_drained(&self) -> bool {
        self.lock().script.is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockProbeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LockProbe for MockLockProbe {
    fn is_locked(&self) -> Result<bool, MonitorError> {
        let mut state = self.lock();
        state.calls += 1;
        match state.script.pop_front() {
            Some(Ok(locked)) => {
                state.last = locked;
                Ok(locked)
            }
            Some(Err(reason)) => Err(MonitorError::ProbeFailed(reason)),
            None => Ok(state.last),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
