//! Concrete LLM provider implementations
//!
//! This module contains implementations of the LLMProvider trait for
//! hosted model services.

pub mod gemini;

pub use gemini::GeminiProvider;
