//! Enumerated types shared across the session subsystem.

use serde::Serialize;

/// Lifecycle of one debugger attached to a subprocess.
///
/// Transitions: `Disconnected -> Starting -> {Ready, Error}`;
/// `Ready <-> Running <-> Stopped`; any -> `Terminated` on subprocess exit;
/// any -> `Error` on I/O collapse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Disconnected,
    Starting,
    Ready,
    Running,
    Stopped,
    Terminated,
    Error,
}

impl SessionState {
    /// `Ready` and `Stopped` are the only states in which new commands may
    /// be submitted.
    #[must_use]
    pub fn accepts_commands(self) -> bool {
        matches!(self, SessionState::Ready | SessionState::Stopped)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Starting => "starting",
            SessionState::Ready => "ready",
            SessionState::Running => "running",
            SessionState::Stopped => "stopped",
            SessionState::Terminated => "terminated",
            SessionState::Error => "error",
        }
    }
}

/// Reason a target stopped, parsed from the MI `reason` field of a
/// `*stopped` record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Breakpoint,
    Watchpoint,
    Signal,
    Step,
    Finish,
    Exited,
    ExitedNormally,
    ExitedSignalled,
    Unknown,
}

impl StopReason {
    /// Map the MI `reason=` string to a `StopReason`.
    #[must_use]
    pub fn from_mi(reason: &str) -> Self {
        match reason {
            "breakpoint-hit" => StopReason::Breakpoint,
            "watchpoint-trigger"
            | "read-watchpoint-trigger"
            | "access-watchpoint-trigger" => StopReason::Watchpoint,
            "signal-received" => StopReason::Signal,
            "end-stepping-range" => StopReason::Step,
            "function-finished" => StopReason::Finish,
            "exited" => StopReason::Exited,
            "exited-normally" => StopReason::ExitedNormally,
            "exited-signalled" => StopReason::ExitedSignalled,
            _ => StopReason::Unknown,
        }
    }
}
