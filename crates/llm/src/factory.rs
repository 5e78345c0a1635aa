//! LLM Factory - Provider Abstraction Layer
//!
//! Creates the configured backend from [`buffet_pos_config::LlmConfig`].
//!
//! ## Supported Providers
//! - **Gemini**: hosted Google models (default, `gemini-2.0-flash`)
//! - **Ollama**: local models

use std::sync::Arc;
use std::time::Duration;

use buffet_pos_config::LlmConfig;

use crate::backend::{LlmBackend, OllamaBackend, OllamaConfig};
use crate::gemini::{GeminiBackend, GeminiConfig, DEFAULT_GEMINI_ENDPOINT};
use crate::LlmError;

/// LLM provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmProvider {
    #[default]
    Gemini,
    Ollama,
}

impl LlmProvider {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Some(LlmProvider::Gemini),
            "ollama" | "local" => Some(LlmProvider::Ollama),
            _ => None,
        }
    }
}

/// Create the backend named by the settings
pub fn create_backend(config: &LlmConfig) -> Result<Arc<dyn LlmBackend>, LlmError> {
    let provider = LlmProvider::from_str(&config.provider).ok_or_else(|| {
        LlmError::Configuration(format!("Unknown LLM provider: {}", config.provider))
    })?;
    let timeout = config.timeout_seconds.map(Duration::from_secs);

    tracing::info!(provider = ?provider, model = %config.model, "Creating LLM backend");

    match provider {
        LlmProvider::Gemini => {
            let backend = GeminiBackend::new(GeminiConfig {
                api_key: config.api_key.clone().unwrap_or_default(),
                model: config.model.clone(),
                endpoint: config
                    .endpoint
                    .clone()
                    .unwrap_or_else(|| DEFAULT_GEMINI_ENDPOINT.to_string()),
                temperature: config.temperature,
                max_output_tokens: config.max_output_tokens,
                timeout,
            })?;
            Ok(Arc::new(backend))
        }
        LlmProvider::Ollama => {
            let defaults = OllamaConfig::default();
            let backend = OllamaBackend::new(OllamaConfig {
                model: config.model.clone(),
                endpoint: config.endpoint.clone().unwrap_or(defaults.endpoint),
                temperature: config.temperature,
                max_tokens: config.max_output_tokens,
                timeout,
                keep_alive: defaults.keep_alive,
            })?;
            Ok(Arc::new(backend))
        }
    }
}
