//! Error types for the MindFlow engine
//!
//! The metrics computation itself is total and never fails; these errors only
//! surface at the boundaries (parsing documents, selecting profiles, driving
//! the focus timer, persisting collections).

use thiserror::Error;

/// Errors that can occur at the engine boundaries
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to parse snapshot: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Unknown behavioral profile: {0}")]
    UnknownProfile(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Focus duration must be between 5 and 180 minutes, got {0}")]
    InvalidTimerDuration(u32),

    #[error("Focus timer is running; pause or finish the session first")]
    TimerRunning,

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}
