//! Error types, one enum per concern so callers can tell failures apart.

use thiserror::Error;

/// Failures installing or running a platform input hook.
#[derive(Debug, Error)]
pub enum HookError {
    #[error("input capture is not supported on {0}")]
    Unsupported(&'static str),

    #[error("input monitoring permission denied: {0}")]
    PermissionDenied(String),

    #[error("platform hook failed: {0}")]
    Platform(String),
}

/// Failures synthesizing a single input event. These are caught by the
/// playback engine, logged, and never abort a run.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("unknown key identifier: {0:?}")]
    UnknownKey(String),

    #[error("unknown button identifier: {0:?}")]
    UnknownButton(String),

    #[error("input synthesis is not supported on {0}")]
    Unsupported(&'static str),

    #[error("platform synthesis failed: {0}")]
    Platform(String),
}

/// Failures starting a playback run.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("nothing to play")]
    Empty,

    #[error("a playback run is already active")]
    Busy,

    #[error("speed must be positive, got {0}")]
    InvalidSpeed(f64),
}

/// Persistence failures. I/O and parse errors stay distinguishable so the
/// caller can surface them differently.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed recording: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Failures of session-level commands.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("cannot {0} while another operation is active")]
    Busy(&'static str),

    #[error("no recording in progress")]
    NotRecording,

    #[error(transparent)]
    Hook(#[from] HookError),

    #[error(transparent)]
    Playback(#[from] PlaybackError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
