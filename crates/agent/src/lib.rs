//! Conversational sales assistant
//!
//! Turns Thai natural-language requests into sales store operations:
//! - `IntentClassifier`: one oracle call per fresh utterance, validated into a `Command`
//! - `DialogueMachine`: slot-filling for new sales and yes/no confirmation
//! - `CommandDispatcher`: runs confirmed or direct commands against the `SalesStore`
//! - `DialogueSessionStore`: per-conversation state between turns
//! - `SalesAssistant`: ties the above into one serialized turn per conversation

pub mod assistant;
pub mod classifier;
pub mod dialogue;
pub mod dispatcher;
pub mod session;
pub mod state;

pub use assistant::{ChatReply, SalesAssistant};
pub use classifier::{extract_json_payload, IntentClassifier};
pub use dialogue::{DialogueMachine, Outcome, SalesQuery};
pub use dispatcher::{format_sales_table, format_thousands, CommandDispatcher};
pub use session::{
    spawn_idle_sweeper, ConversationGuard, ConversationLocks, DialogueSessionStore,
    InMemoryDialogueStore,
};
pub use state::{ConversationSnapshot, DialogueState, PendingAction, PendingCommand};

use buffet_pos_core::{CommandError, InvalidFieldValue, SaleId, StoreError};
use buffet_pos_llm::LlmError;
use thiserror::Error;

/// Agent errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Intent classifier unavailable: {0}")]
    ClassifierUnavailable(String),

    #[error("Malformed oracle response: {0}")]
    MalformedOracleResponse(String),

    #[error(transparent)]
    InvalidFieldValue(#[from] InvalidFieldValue),

    #[error("Sales store error: {0}")]
    DownstreamStore(String),

    #[error("Sale {0} not found")]
    NotFound(SaleId),

    #[error("Session store error: {0}")]
    Session(String),
}

impl AgentError {
    /// Short label for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            AgentError::ClassifierUnavailable(_) => "classifier_unavailable",
            AgentError::MalformedOracleResponse(_) => "malformed_oracle_response",
            AgentError::InvalidFieldValue(_) => "invalid_field_value",
            AgentError::DownstreamStore(_) => "downstream_store",
            AgentError::NotFound(_) => "not_found",
            AgentError::Session(_) => "session",
        }
    }
}

impl From<LlmError> for AgentError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::InvalidResponse(msg) => AgentError::MalformedOracleResponse(msg),
            other => AgentError::ClassifierUnavailable(other.to_string()),
        }
    }
}

impl From<CommandError> for AgentError {
    fn from(err: CommandError) -> Self {
        AgentError::MalformedOracleResponse(err.to_string())
    }
}

impl From<StoreError> for AgentError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => AgentError::NotFound(id),
            other => AgentError::DownstreamStore(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_error_mapping() {
        let err: AgentError = LlmError::Network("connection refused".to_string()).into();
        assert!(matches!(err, AgentError::ClassifierUnavailable(_)));

        let err: AgentError = LlmError::Api {
            status: 503,
            message: "overloaded".to_string(),
        }
        .into();
        assert_eq!(err.kind(), "classifier_unavailable");

        let err: AgentError = LlmError::InvalidResponse("no candidates".to_string()).into();
        assert!(matches!(err, AgentError::MalformedOracleResponse(_)));
    }

    #[test]
    fn test_store_error_mapping() {
        let err: AgentError = StoreError::NotFound(4).into();
        assert!(matches!(err, AgentError::NotFound(4)));
        let err: AgentError = StoreError::Backend("disk full".to_string()).into();
        assert_eq!(err.kind(), "downstream_store");
    }

    #[test]
    fn test_command_error_is_malformed() {
        let err: AgentError = CommandError::MissingAction.into();
        assert!(matches!(err, AgentError::MalformedOracleResponse(_)));
    }
}
