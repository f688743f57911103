//! Language-model provider layer for finsight
//!
//! This crate provides a provider-agnostic way to send a prompt to a hosted
//! model and get text back. It includes:
//!
//! - Message and completion request/response types
//! - The [`LLMProvider`] trait
//! - A Google Gemini implementation over `reqwest`
//! - A connectivity probe and troubleshooting hints for failed calls

pub mod completion;
pub mod diagnostics;
pub mod error;
pub mod messages;
pub mod provider;
pub mod providers;

// Re-export main types
pub use completion::{CompletionRequest, CompletionResponse, StopReason, TokenUsage};
pub use diagnostics::troubleshooting_hints;
pub use error::{LLMError, Result};
pub use messages::{Message, Role};
pub use provider::{LLMProvider, PROBE_PROMPT, probe};
pub use providers::GeminiProvider;
