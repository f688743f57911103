//! Google Gemini provider implementation
//!
//! This module implements the LLMProvider trait for Gemini models through the
//! Generative Language REST API.
//! See: https://ai.google.dev/api/generate-content

use crate::{
    CompletionRequest, CompletionResponse, LLMError, LLMProvider, Message, Result, Role,
    StopReason, TokenUsage,
};
use async_trait::async_trait;
use finsight_utils::AppConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Gemini provider
///
/// Works with any model exposed by `models/{model}:generateContent`, e.g.
/// - gemini-2.0-flash
/// - gemini-1.5-pro
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    api_base: String,
}

impl GeminiProvider {
    /// Create a new Gemini provider
    ///
    /// # Arguments
    ///
    /// * `api_key` - Google AI API key
    /// * `timeout` - Per-request HTTP timeout
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LLMError::ConfigurationError(
                "Gemini API key must not be empty".to_string(),
            ));
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key,
            api_base: GEMINI_API_BASE.to_string(),
        })
    }

    /// Create a provider from the application configuration
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(config.google_api_key.clone(), config.request_timeout)
    }

    /// Point the provider at a different API base (proxies, tests)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{model}:generateContent", self.api_base)
    }
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        debug!("Sending request to Gemini API");

        let model = request.model.clone();
        let gemini_request = GeminiRequest::from(request);

        let response = self
            .client
            .post(self.endpoint(&model))
            .header("x-goog-api-key", &self.api_key)
            .json(&gemini_request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await?;
            return Err(map_error(status, &model, &error_text));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            LLMError::UnexpectedResponse(format!("Failed to parse response: {e}"))
        })?;

        let completion = gemini_response.into_completion()?;
        debug!(
            "Received response - stop_reason: {:?}, tokens: {}/{}",
            completion.stop_reason, completion.usage.input_tokens, completion.usage.output_tokens
        );

        Ok(completion)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

/// Map a non-success HTTP status to a typed error
fn map_error(status: u16, model: &str, body: &str) -> LLMError {
    let message = serde_json::from_str::<GeminiErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.to_string());

    match status {
        // Gemini reports a bad key as 400 INVALID_ARGUMENT.
        400 if message.contains("API key") => LLMError::AuthenticationFailed(message),
        400 => LLMError::InvalidRequest(message),
        401 => LLMError::AuthenticationFailed(message),
        403 => LLMError::PermissionDenied(message),
        404 => LLMError::ModelNotFound(model.to_string()),
        429 => LLMError::RateLimitExceeded(message),
        _ => LLMError::RequestFailed(format!("HTTP {status}: {message}")),
    }
}

// Gemini-specific request/response types
// These match the generateContent wire format

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    generation_config: GenerationConfig,
}

impl From<CompletionRequest> for GeminiRequest {
    fn from(request: CompletionRequest) -> Self {
        Self {
            contents: request.messages.into_iter().map(GeminiContent::from).collect(),
            system_instruction: request.system.map(|text| GeminiContent {
                role: None,
                parts: vec![GeminiPart { text }],
            }),
            generation_config: GenerationConfig {
                max_output_tokens: request.max_tokens,
                temperature: request.temperature,
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

impl From<Message> for GeminiContent {
    fn from(message: Message) -> Self {
        let role = match message.role {
            Role::User => "user",
            Role::Assistant => "model",
        };
        Self {
            role: Some(role.to_string()),
            parts: vec![GeminiPart { text: message.text }],
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: usize,
    #[serde(default)]
    candidates_token_count: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorEnvelope {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

impl GeminiResponse {
    fn into_completion(self) -> Result<CompletionResponse> {
        let usage = self
            .usage_metadata
            .map(|u| TokenUsage {
                input_tokens: u.prompt_token_count,
                output_tokens: u.candidates_token_count,
            })
            .unwrap_or_default();

        let Some(candidate) = self.candidates.into_iter().next() else {
            let reason = self
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates returned".to_string());
            return Err(LLMError::Blocked(reason));
        };

        let stop_reason = match candidate.finish_reason.as_deref() {
            Some("STOP") | None => StopReason::EndTurn,
            Some("MAX_TOKENS") => StopReason::MaxTokens,
            Some("SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT") => {
                StopReason::Blocked
            }
            Some(other) => {
                debug!("Unknown finish reason: {}", other);
                StopReason::Other
            }
        };

        let text: String = candidate
            .content
            .map(|content| content.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() && stop_reason == StopReason::Blocked {
            return Err(LLMError::Blocked(
                "candidate stopped by a content filter".to_string(),
            ));
        }

        Ok(CompletionResponse {
            text,
            stop_reason,
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_provider_creation() {
        let provider = GeminiProvider::new("test-key", Duration::from_secs(5));
        assert!(provider.is_ok());
        assert_eq!(provider.unwrap().name(), "gemini");
    }

    #[test]
    fn test_empty_key_rejected() {
        let err = GeminiProvider::new("  ", Duration::from_secs(5)).err().unwrap();
        assert!(matches!(err, LLMError::ConfigurationError(_)));
    }

    #[test]
    fn test_endpoint() {
        let provider = GeminiProvider::new("k", Duration::from_secs(5))
            .unwrap()
            .with_api_base("http://localhost:8080/v1beta/");
        assert_eq!(
            provider.endpoint("gemini-2.0-flash"),
            "http://localhost:8080/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn test_request_wire_format() {
        let request = CompletionRequest::builder("gemini-2.0-flash")
            .system("You are an analyst")
            .add_message(Message::user("Hi"))
            .add_message(Message::assistant("Hello"))
            .max_tokens(256)
            .temperature(0.2)
            .build();

        let value = serde_json::to_value(GeminiRequest::from(request)).unwrap();
        assert_eq!(
            value,
            json!({
                "contents": [
                    { "role": "user", "parts": [{ "text": "Hi" }] },
                    { "role": "model", "parts": [{ "text": "Hello" }] }
                ],
                "systemInstruction": { "parts": [{ "text": "You are an analyst" }] },
                "generationConfig": { "maxOutputTokens": 256, "temperature": 0.2 }
            })
        );
    }

    #[test]
    fn test_parse_response() {
        let raw = json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "Connection " }, { "text": "test successful" }] },
                "finishReason": "STOP"
            }],
            "usageMetadata": { "promptTokenCount": 7, "candidatesTokenCount": 4, "totalTokenCount": 11 }
        });

        let response: GeminiResponse = serde_json::from_value(raw).unwrap();
        let completion = response.into_completion().unwrap();
        assert_eq!(completion.text, "Connection test successful");
        assert_eq!(completion.stop_reason, StopReason::EndTurn);
        assert_eq!(completion.usage.total(), 11);
    }

    #[test]
    fn test_parse_blocked_prompt() {
        let raw = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        let response: GeminiResponse = serde_json::from_value(raw).unwrap();
        let err = response.into_completion().unwrap_err();
        assert!(matches!(err, LLMError::Blocked(reason) if reason == "SAFETY"));
    }

    #[test]
    fn test_parse_max_tokens() {
        let raw = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "partial" }] },
                "finishReason": "MAX_TOKENS"
            }]
        });
        let response: GeminiResponse = serde_json::from_value(raw).unwrap();
        let completion = response.into_completion().unwrap();
        assert_eq!(completion.stop_reason, StopReason::MaxTokens);
        assert_eq!(completion.usage, TokenUsage::default());
    }

    #[test]
    fn test_map_error() {
        let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}"#;
        assert!(matches!(
            map_error(400, "m", body),
            LLMError::AuthenticationFailed(msg) if msg.starts_with("API key not valid")
        ));
        assert!(matches!(map_error(400, "m", "bad json"), LLMError::InvalidRequest(_)));
        assert!(matches!(map_error(403, "m", "{}"), LLMError::PermissionDenied(_)));
        assert!(matches!(map_error(404, "gemini-x", ""), LLMError::ModelNotFound(m) if m == "gemini-x"));
        assert!(matches!(map_error(429, "m", "quota"), LLMError::RateLimitExceeded(_)));
        assert!(matches!(map_error(500, "m", "oops"), LLMError::RequestFailed(msg) if msg.contains("500")));
    }
}
