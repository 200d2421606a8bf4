// Error types for hostprov

use std::time::Duration;
use thiserror::Error;

/// Result type alias using anyhow::Error
pub type Result<T> = anyhow::Result<T>;

/// Hostprov-specific error types
#[derive(Error, Debug)]
pub enum HostprovError {
    #[error("Failed to spawn '{command}': {message}")]
    CommandSpawn { command: String, message: String },

    #[error("Command '{command}' failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("Command '{command}' timed out after {limit:?}")]
    CommandTimeout { command: String, limit: Duration },

    #[error("Invalid unit template: {0}")]
    InvalidTemplate(String),

    #[error("Clock synchronization failed: {0}")]
    ClockSync(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
