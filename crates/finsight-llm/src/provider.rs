//! LLM provider trait definition

use crate::{CompletionRequest, CompletionResponse, LLMError, Message, Result};
use async_trait::async_trait;
use tracing::debug;

/// Prompt sent by [`probe`]
pub const PROBE_PROMPT: &str = "Respond with: Connection test successful";

/// Trait for LLM providers
///
/// Implementations of this trait provide access to a hosted model. A single
/// provider is shared across workflow steps, so implementations must be
/// safe to call from several tasks at once.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate a completion from the LLM
    ///
    /// # Arguments
    ///
    /// * `request` - The completion request with messages and parameters
    ///
    /// # Returns
    ///
    /// The completion response with the assistant's text and metadata
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Get the provider name (e.g., "gemini")
    fn name(&self) -> &str;
}

/// Check that the provider is reachable and the credentials work
///
/// Sends a tiny prompt and returns the model's reply. Callers are expected to
/// run this under a short deadline.
pub async fn probe(provider: &dyn LLMProvider, model: &str) -> Result<String> {
    debug!(provider = provider.name(), model, "Probing model");

    let request = CompletionRequest::builder(model)
        .add_message(Message::user(PROBE_PROMPT))
        .max_tokens(32)
        .temperature(0.0)
        .build();

    let response = provider.complete(request).await?;
    let text = response.text.trim().to_string();

    if text.is_empty() {
        return Err(LLMError::UnexpectedResponse(
            "probe returned an empty reply".to_string(),
        ));
    }

    Ok(text)
}
