//! Error types for configuration loading

use thiserror::Error;

/// Result type alias for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors raised while building the application configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required environment variable is missing or empty
    #[error("Missing required environment variable: {0}")]
    MissingVariable(String),

    /// A variable is present but cannot be parsed
    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },

    /// The assembled configuration is inconsistent
    #[error("Configuration error: {0}")]
    Invalid(String),
}
