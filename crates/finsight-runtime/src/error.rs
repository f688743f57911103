//! Error types for the bounded runner

use thiserror::Error;

/// Result type alias for runner operations
pub type Result<T> = std::result::Result<T, RunnerError>;

/// Errors raised by the runner itself
///
/// These describe caller misuse or resource exhaustion. The wrapped
/// operation's own failures never surface here; they arrive as
/// [`crate::Outcome::Failed`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunnerError {
    /// The deadline was zero
    #[error("Configuration error: deadline for '{label}' must be greater than zero")]
    InvalidDeadline { label: String },

    /// The worker thread could not be started
    #[error("Failed to start worker for '{label}': {reason}")]
    SpawnFailed { label: String, reason: String },

    /// A deadline policy was built from invalid settings
    #[error("Configuration error: {0}")]
    Configuration(String),
}
