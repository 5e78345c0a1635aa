//! Gemini backend
//!
//! Calls `models/{model}:generateContent` with the whole conversation
//! flattened into a single user part, and reads the answer from
//! `candidates[0].content.parts[0].text`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::backend::{build_client, FinishReason, GenerationResult, LlmBackend};
use crate::prompt::{flatten_messages, Message};
use crate::LlmError;

pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini client configuration
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    /// Model name (e.g., "gemini-2.0-flash")
    pub model: String,
    /// Base endpoint URL
    pub endpoint: String,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    /// Request timeout; none when absent
    pub timeout: Option<Duration>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-2.0-flash".to_string(),
            endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
            temperature: None,
            max_output_tokens: None,
            timeout: None,
        }
    }
}

pub struct GeminiBackend {
    client: Client,
    config: GeminiConfig,
}

impl GeminiBackend {
    pub fn new(config: GeminiConfig) -> Result<Self, LlmError> {
        if config.api_key.trim().is_empty() {
            tracing::warn!("Gemini backend created without an API key");
        }
        let client = build_client(config.timeout)?;
        Ok(Self { client, config })
    }

    fn build_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }

    fn build_request(&self, messages: &[Message]) -> GeminiRequest {
        let generation_config =
            if self.config.temperature.is_some() || self.config.max_output_tokens.is_some() {
                Some(GeminiGenerationConfig {
                    temperature: self.config.temperature,
                    max_output_tokens: self.config.max_output_tokens,
                })
            } else {
                None
            };

        GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart {
                    text: flatten_messages(messages),
                }],
            }],
            generation_config,
        }
    }
}

/// Pull the first text part out of a `generateContent` response body
fn extract_text(body: GeminiResponse) -> Result<(String, FinishReason), LlmError> {
    if let Some(error) = body.error {
        return Err(LlmError::InvalidResponse(format!(
            "Gemini API error: {}",
            error.message
        )));
    }

    let candidate = body
        .candidates
        .and_then(|c| c.into_iter().next())
        .ok_or_else(|| LlmError::InvalidResponse("No candidates in response".to_string()))?;

    let finish_reason = match candidate.finish_reason.as_deref() {
        Some("STOP") | None => FinishReason::Stop,
        Some("MAX_TOKENS") => FinishReason::Length,
        Some(_) => FinishReason::Other,
    };

    let text = candidate
        .content
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .ok_or_else(|| LlmError::InvalidResponse("No text content in response".to_string()))?;

    Ok((text, finish_reason))
}

#[async_trait]
impl LlmBackend for GeminiBackend {
    async fn generate(&self, messages: &[Message]) -> Result<GenerationResult, LlmError> {
        let start = Instant::now();
        let request = self.build_request(messages);

        let response = self
            .client
            .post(self.build_url())
            .query(&[("key", self.config.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Gemini request failed");
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let text = response.text().await?;
        let body: GeminiResponse =
            serde_json::from_str(&text).map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
        let (text, finish_reason) = extract_text(body)?;

        let total_time_ms = start.elapsed().as_millis() as u64;
        tracing::debug!(model = %self.config.model, total_time_ms, "Gemini generation complete");

        Ok(GenerationResult {
            text,
            total_time_ms,
            finish_reason,
        })
    }

    async fn is_available(&self) -> bool {
        !self.config.api_key.trim().is_empty()
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

// Gemini API request/response structures

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    error: Option<GeminiErrorDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContentResponse>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
struct GeminiPartResponse {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> GeminiBackend {
        GeminiBackend::new(GeminiConfig {
            api_key: "test-key".to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    fn parse(json: &str) -> Result<(String, FinishReason), LlmError> {
        extract_text(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_default_config() {
        let config = GeminiConfig::default();
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.endpoint, DEFAULT_GEMINI_ENDPOINT);
        assert!(config.timeout.is_none());
    }

    #[test]
    fn test_build_url() {
        assert_eq!(
            backend().build_url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn test_request_is_single_flattened_part() {
        let request = backend().build_request(&[Message::system("SYS"), Message::user("สวัสดี")]);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"].as_array().unwrap().len(), 1);
        assert_eq!(json["contents"][0]["parts"][0]["text"], "SYS\n\nUser: สวัสดี");
        assert!(json.get("generationConfig").is_none());
    }

    #[test]
    fn test_extract_text() {
        let (text, reason) = parse(
            r#"{"candidates":[{"content":{"parts":[{"text":"{\"action\":\"GET_SALES\"}"}],"role":"model"},"finishReason":"STOP"}]}"#,
        )
        .unwrap();
        assert_eq!(text, r#"{"action":"GET_SALES"}"#);
        assert_eq!(reason, FinishReason::Stop);
    }

    #[test]
    fn test_missing_text_path_is_invalid_response() {
        assert!(matches!(parse(r#"{"candidates":[]}"#), Err(LlmError::InvalidResponse(_))));
        assert!(matches!(
            parse(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#),
            Err(LlmError::InvalidResponse(_))
        ));
        assert!(matches!(parse(r#"{}"#), Err(LlmError::InvalidResponse(_))));
        assert!(matches!(
            parse(r#"{"error":{"message":"quota","code":429}}"#),
            Err(LlmError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_invalid_response_is_not_unavailable() {
        let err = parse(r#"{"candidates":[]}"#).unwrap_err();
        assert!(!err.is_unavailable());
    }
}
