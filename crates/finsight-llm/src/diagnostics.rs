//! Human-readable hints for failed model calls

use crate::LLMError;

/// Suggest fixes for a failed model call
///
/// Returns an empty list when there is nothing more specific to say than
/// the error itself.
pub fn troubleshooting_hints(error: &LLMError) -> Vec<&'static str> {
    match error {
        LLMError::HttpError(e) if e.is_timeout() => vec![
            "The request timed out. Try again or check your network.",
            "Increase FINSIGHT_REQUEST_TIMEOUT_SECS for slow connections.",
        ],
        LLMError::HttpError(e) if e.is_connect() => vec![
            "Check your internet connection.",
            "Check for firewall or proxy settings blocking generativelanguage.googleapis.com.",
        ],
        LLMError::HttpError(_) | LLMError::RequestFailed(_) => vec![
            "Check your internet connection.",
            "Verify that GOOGLE_API_KEY is valid.",
        ],
        LLMError::AuthenticationFailed(_) => vec![
            "The API key appears to be invalid. Regenerate it in Google AI Studio.",
            "Make sure GOOGLE_API_KEY in your .env file has no surrounding quotes.",
        ],
        LLMError::PermissionDenied(_) => vec![
            "Enable the Generative Language API for the key's Google Cloud project.",
        ],
        LLMError::RateLimitExceeded(_) => vec![
            "Quota or rate limit reached. Check billing and quota in Google Cloud.",
            "Wait a minute and retry, or use quick analysis to make fewer calls.",
        ],
        LLMError::ModelNotFound(_) => vec![
            "Check GEMINI_MODEL; the model name may be misspelled or retired.",
        ],
        LLMError::Blocked(_) => vec!["Rephrase the request; the model's safety filter stopped it."],
        LLMError::ConfigurationError(_) => vec!["Check your .env file and environment variables."],
        LLMError::InvalidRequest(_)
        | LLMError::SerializationError(_)
        | LLMError::UnexpectedResponse(_) => Vec::new(),
    }
}
