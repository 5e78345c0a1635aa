//! LLM integration for intent classification
//!
//! Features:
//! - Pluggable backends behind [`LlmBackend`] (Gemini, Ollama)
//! - Provider selection from settings via [`create_backend`]
//! - Single-shot, non-streaming generation; no retries

pub mod backend;
pub mod factory;
pub mod gemini;
pub mod prompt;

pub use backend::{FinishReason, GenerationResult, LlmBackend, OllamaBackend, OllamaConfig};
pub use factory::{create_backend, LlmProvider};
pub use gemini::{GeminiBackend, GeminiConfig};
pub use prompt::{flatten_messages, Message, Role};

use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl LlmError {
    /// Whether the oracle could not be reached or refused the request
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            LlmError::Api { .. } | LlmError::Network(_) | LlmError::Timeout
        )
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Network(err.to_string())
        }
    }
}
