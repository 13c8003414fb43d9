//! Error types for autoflow

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AutoflowError {
    /// Missing token, oversized task description, or an unusable config file.
    /// Raised before any network activity.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The planner rejected the connection handshake (HTTP 401/403).
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The planner endpoint is unreachable or the transport failed.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A command could not be executed against the page.
    #[error("Command dispatch failed: {0}")]
    Dispatch(String),

    /// The planner asked for a command this client does not know.
    #[error("Unsupported command {0}")]
    UnsupportedCommand(String),

    /// The task did not receive its terminal message before the deadline.
    #[error("Task timed out after {0:?}")]
    Timeout(Duration),

    /// The task's terminal message carried an error, or marked the action
    /// unsuccessful with no usable result. The message is already prefixed
    /// with the package name, version and task id.
    #[error("{0}")]
    Task(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AutoflowError>;
