//! Intent classifier client
//!
//! Sends the system prompt (today's date, price list, action schemas) plus
//! the user's utterance to the oracle once, then validates the answer into a
//! [`Command`]. There is no retry; failures surface to the caller and no
//! dialogue state is created.

use std::sync::Arc;
use std::time::Instant;

use chrono::{Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use buffet_pos_config::{DomainConfig, SystemPromptConfig};
use buffet_pos_core::{Command, PricingTable};
use buffet_pos_llm::{LlmBackend, Message};

use crate::AgentError;

static JSON_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)```json\s*(.*?)\s*```").expect("valid JSON fence pattern")
});

/// Body of the first ```` ```json ```` fence, or the whole (trimmed) text
pub fn extract_json_payload(text: &str) -> &str {
    JSON_FENCE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or_else(|| text.trim())
}

pub struct IntentClassifier {
    backend: Arc<dyn LlmBackend>,
    system_prompt: SystemPromptConfig,
    pricing: PricingTable,
    fixed_today: Option<NaiveDate>,
}

impl IntentClassifier {
    pub fn new(backend: Arc<dyn LlmBackend>, domain: &DomainConfig) -> Self {
        Self {
            backend,
            system_prompt: domain.system_prompt.clone(),
            pricing: domain.pricing.clone(),
            fixed_today: None,
        }
    }

    /// Pin "today" instead of reading the local clock
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.fixed_today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.fixed_today
            .unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn build_messages(&self, utterance: &str) -> Vec<Message> {
        let system = self
            .system_prompt
            .render(self.today(), &self.pricing.describe());
        vec![Message::system(system), Message::user(utterance)]
    }

    pub async fn classify(&self, utterance: &str) -> Result<Command, AgentError> {
        let start = Instant::now();
        let messages = self.build_messages(utterance);

        let result = self.backend.generate(&messages).await.map_err(|e| {
            tracing::warn!(error = %e, model = self.backend.model_name(), "Oracle call failed");
            AgentError::from(e)
        })?;

        let payload = extract_json_payload(&result.text);
        let command = Command::from_json(payload).map_err(|e| {
            tracing::warn!(error = %e, raw = %result.text, "Oracle answer does not match the command schema");
            AgentError::from(e)
        })?;

        tracing::info!(
            command = %command.kind(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Classified utterance"
        );
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use buffet_pos_core::CommandKind;
    use buffet_pos_llm::{FinishReason, GenerationResult, LlmError};
    use parking_lot::Mutex;

    /// Returns a canned answer and records the prompt it was given
    struct CannedOracle {
        answer: Result<String, fn() -> LlmError>,
        seen: Mutex<Vec<Vec<Message>>>,
    }

    impl CannedOracle {
        fn ok(text: &str) -> Arc<Self> {
            Arc::new(Self {
                answer: Ok(text.to_string()),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn failing(err: fn() -> LlmError) -> Arc<Self> {
            Arc::new(Self {
                answer: Err(err),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LlmBackend for CannedOracle {
        async fn generate(&self, messages: &[Message]) -> Result<GenerationResult, LlmError> {
            self.seen.lock().push(messages.to_vec());
            match &self.answer {
                Ok(text) => Ok(GenerationResult {
                    text: text.clone(),
                    total_time_ms: 1,
                    finish_reason: FinishReason::Stop,
                }),
                Err(make) => Err(make()),
            }
        }

        async fn is_available(&self) -> bool {
            true
        }

        fn model_name(&self) -> &str {
            "canned"
        }
    }

    fn classifier(oracle: Arc<CannedOracle>) -> IntentClassifier {
        IntentClassifier::new(oracle, &DomainConfig::default())
            .with_today(NaiveDate::from_ymd_opt(2025, 1, 20).unwrap())
    }

    #[test]
    fn test_extract_fenced_json() {
        let text = "นี่คือคำตอบ\n```json\n{\"action\": \"GET_SALES\"}\n```\nขอบคุณค่ะ";
        assert_eq!(extract_json_payload(text), "{\"action\": \"GET_SALES\"}");
    }

    #[test]
    fn test_extract_raw_json() {
        assert_eq!(extract_json_payload("  {\"action\": \"UNKNOWN\"}\n"), "{\"action\": \"UNKNOWN\"}");
    }

    #[test]
    fn test_prompt_contains_date_prices_and_utterance() {
        let oracle = CannedOracle::ok("{}");
        let messages = classifier(oracle).build_messages("ดูยอดขาย");
        assert_eq!(messages.len(), 2);
        assert!(messages[0].content.contains("2025-01-20"));
        assert!(messages[0].content.contains("599"));
        assert!(messages[0].content.contains("DELETE_SALE"));
        assert_eq!(messages[1].content, "ดูยอดขาย");
    }

    #[tokio::test]
    async fn test_classify_fenced_answer() {
        let oracle = CannedOracle::ok(
            "```json\n{\"action\": \"ADD_SALE\", \"parameters\": {\"tableNumber\": 5}}\n```",
        );
        let command = classifier(oracle.clone()).classify("โต๊ะ 5").await.unwrap();
        assert_eq!(command.kind(), CommandKind::AddSale);
        assert_eq!(oracle.seen.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_non_json_is_malformed() {
        let oracle = CannedOracle::ok("ขออภัยค่ะ ฉันไม่แน่ใจ");
        let err = classifier(oracle).classify("???").await.unwrap_err();
        assert!(matches!(err, AgentError::MalformedOracleResponse(_)));
    }

    #[tokio::test]
    async fn test_unknown_action_is_malformed() {
        let oracle = CannedOracle::ok(r#"{"action": "BOOK_TABLE"}"#);
        let err = classifier(oracle).classify("จองโต๊ะ").await.unwrap_err();
        assert!(matches!(err, AgentError::MalformedOracleResponse(_)));
    }

    #[tokio::test]
    async fn test_network_failure_is_unavailable() {
        let oracle = CannedOracle::failing(|| LlmError::Network("connection refused".to_string()));
        let err = classifier(oracle.clone()).classify("ดูยอดขาย").await.unwrap_err();
        assert!(matches!(err, AgentError::ClassifierUnavailable(_)));
        // single attempt, no retry
        assert_eq!(oracle.seen.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_text_is_malformed() {
        let oracle =
            CannedOracle::failing(|| LlmError::InvalidResponse("No candidates".to_string()));
        let err = classifier(oracle).classify("ดูยอดขาย").await.unwrap_err();
        assert!(matches!(err, AgentError::MalformedOracleResponse(_)));
    }
}
