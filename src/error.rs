//! Shared error model for the debugger-session subsystem.
//!
//! A single closed enumeration, not a hierarchy: every internal failure path
//! maps to one of these kinds and carries an optional detail string that
//! supplements (never replaces) the per-kind message below.

use thiserror::Error;

/// Closed set of failure kinds shared by the parser, the session pipeline,
/// the registry, and the tool dispatch shim.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GdbError {
    #[error("Session not found")]
    SessionNotFound,

    #[error("Session not ready for commands")]
    SessionNotReady,

    #[error("Maximum session count reached")]
    SessionLimit,

    #[error("Failed to spawn GDB process: {0}")]
    SpawnFailed(String),

    #[error("Command timed out")]
    Timeout,

    #[error("GDB command failed: {0}")]
    CommandFailed(String),

    #[error("Failed to parse MI output: {0}")]
    ParseError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Failed to attach to process: {0}")]
    AttachFailed(String),

    #[error("Session already has a running program")]
    AlreadyRunning,

    #[error("No program is running")]
    NotRunning,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GdbError {
    /// The fixed, kind-only message (no detail suffix), matching the
    /// original implementation's per-code message table.
    #[must_use]
    pub fn kind_message(&self) -> &'static str {
        match self {
            GdbError::SessionNotFound => "Session not found",
            GdbError::SessionNotReady => "Session not ready for commands",
            GdbError::SessionLimit => "Maximum session count reached",
            GdbError::SpawnFailed(_) => "Failed to spawn GDB process",
            GdbError::Timeout => "Command timed out",
            GdbError::CommandFailed(_) => "GDB command failed",
            GdbError::ParseError(_) => "Failed to parse MI output",
            GdbError::InvalidArgument(_) => "Invalid argument",
            GdbError::FileNotFound(_) => "File not found",
            GdbError::AttachFailed(_) => "Failed to attach to process",
            GdbError::AlreadyRunning => "Session already has a running program",
            GdbError::NotRunning => "No program is running",
            GdbError::Internal(_) => "Internal error",
        }
    }
}

pub type GdbResult<T> = Result<T, GdbError>;
