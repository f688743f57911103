//! Error types for tool invocations

use thiserror::Error;

/// Result type for tool invocations
pub type Result<T> = std::result::Result<T, ToolError>;

/// Errors a tool can report back to its caller
#[derive(Error, Debug)]
pub enum ToolError {
    /// Input contained characters outside the allowed set
    #[error(
        "Invalid characters in expression. Only numbers, +, -, *, /, ., (, ), and spaces allowed."
    )]
    InvalidCharacters,

    /// Division by zero while evaluating an expression
    #[error("Division by zero")]
    DivisionByZero,

    /// Expression could not be parsed
    #[error("Invalid mathematical expression syntax: {0}")]
    Syntax(String),

    /// Input was malformed for the tool
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No tool with the requested name is configured
    #[error("Unknown tool '{0}'")]
    UnknownTool(String),

    /// A remote API returned an error
    #[error("API error: {0}")]
    Api(String),

    /// Nothing was found for the request
    #[error("Not found: {0}")]
    NotFound(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ToolError {
    /// Whether the failure came from the network or a remote service
    pub fn is_remote(&self) -> bool {
        matches!(self, ToolError::Api(_) | ToolError::Http(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(ToolError::DivisionByZero.to_string(), "Division by zero");
        assert!(ToolError::InvalidCharacters.to_string().contains("Only numbers"));
        assert_eq!(
            ToolError::UnknownTool("Crystal Ball".to_string()).to_string(),
            "Unknown tool 'Crystal Ball'"
        );
    }

    #[test]
    fn test_is_remote() {
        assert!(ToolError::Api("500".to_string()).is_remote());
        assert!(!ToolError::DivisionByZero.is_remote());
    }
}
