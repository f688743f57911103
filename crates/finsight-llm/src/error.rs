//! Errors from model calls

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LLMError>;

/// Why a model call failed
///
/// Variants mirror the HTTP statuses the Gemini API answers with, so callers
/// can tell a bad key from a missing model from a spent quota.
#[derive(Error, Debug)]
pub enum LLMError {
    #[error("Model request failed: {0}")]
    RequestFailed(String),

    /// 401, or a 400 that names the API key
    #[error("API key rejected: {0}")]
    AuthenticationFailed(String),

    /// 403: the key works but the Generative Language API is not enabled
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// 429
    #[error("Quota or rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// Safety or recitation filters stopped the answer
    #[error("Response blocked: {0}")]
    Blocked(String),

    #[error("Could not decode model response: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl LLMError {
    /// Fixing this needs a different key or account settings, not a retry
    pub fn is_credential_problem(&self) -> bool {
        matches!(
            self,
            LLMError::AuthenticationFailed(_)
                | LLMError::PermissionDenied(_)
                | LLMError::ConfigurationError(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_problems() {
        assert!(LLMError::AuthenticationFailed("bad key".into()).is_credential_problem());
        assert!(LLMError::PermissionDenied("disabled".into()).is_credential_problem());
        assert!(!LLMError::RateLimitExceeded("quota".into()).is_credential_problem());
        assert!(!LLMError::ModelNotFound("gemini-9".into()).is_credential_problem());
    }
}
