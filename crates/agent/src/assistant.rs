//! Sales assistant turn handler
//!
//! One call to [`SalesAssistant::handle`] is one conversational turn:
//!
//! 1. lock the conversation id
//! 2. load its dialogue state (absent = idle)
//! 3. idle: classify the utterance; otherwise feed it to the pending step
//! 4. dispatch queries / confirmed mutations to the sales store
//! 5. write the next state back (or delete it when idle) and unlock

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;

use buffet_pos_config::{DialogueConfig, DomainConfig, ResponseTemplates};
use buffet_pos_core::{Sale, SalesStore};
use buffet_pos_llm::LlmBackend;

use crate::classifier::IntentClassifier;
use crate::dialogue::{DialogueMachine, Outcome};
use crate::dispatcher::CommandDispatcher;
use crate::session::{ConversationLocks, DialogueSessionStore};
use crate::state::{DialogueState, PendingAction};
use crate::AgentError;

/// Reply for one turn
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub reply: String,
    /// Records backing a list/analysis reply
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Sale>>,
    pub conversation_id: String,
    /// What the conversation waits for after this turn
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_action: Option<PendingAction>,
}

pub struct SalesAssistant {
    classifier: IntentClassifier,
    machine: DialogueMachine,
    dispatcher: CommandDispatcher,
    sessions: Arc<dyn DialogueSessionStore>,
    locks: ConversationLocks,
    default_conversation_id: String,
}

impl SalesAssistant {
    pub fn new(
        backend: Arc<dyn LlmBackend>,
        store: Arc<dyn SalesStore>,
        sessions: Arc<dyn DialogueSessionStore>,
        domain: &DomainConfig,
        dialogue: &DialogueConfig,
    ) -> Self {
        Self {
            classifier: IntentClassifier::new(backend, domain),
            machine: DialogueMachine::from_domain(domain),
            dispatcher: CommandDispatcher::new(store, domain.responses.clone()),
            sessions,
            locks: ConversationLocks::new(),
            default_conversation_id: dialogue.default_conversation_id.clone(),
        }
    }

    /// Pin the date the classifier treats as today
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.classifier = self.classifier.with_today(today);
        self
    }

    pub fn templates(&self) -> &ResponseTemplates {
        self.machine.templates()
    }

    pub fn sessions(&self) -> &Arc<dyn DialogueSessionStore> {
        &self.sessions
    }

    /// Requested id, or the default when absent or blank
    pub fn resolve_conversation_id(&self, requested: Option<&str>) -> String {
        requested
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .unwrap_or(self.default_conversation_id.as_str())
            .to_string()
    }

    /// Current state of a conversation (idle when unknown)
    pub async fn state(&self, conversation_id: &str) -> Result<DialogueState, AgentError> {
        Ok(self.sessions.get(conversation_id).await?.unwrap_or_default())
    }

    /// Forget a conversation's pending dialogue
    pub async fn reset(&self, conversation_id: &str) -> Result<(), AgentError> {
        let _guard = self.locks.acquire(conversation_id).await;
        self.sessions.delete(conversation_id).await
    }

    /// Process one user message
    pub async fn handle(
        &self,
        conversation_id: Option<&str>,
        message: &str,
    ) -> Result<ChatReply, AgentError> {
        let conversation_id = self.resolve_conversation_id(conversation_id);
        let _guard = self.locks.acquire(&conversation_id).await;

        let state = self.sessions.get(&conversation_id).await?.unwrap_or_default();
        tracing::debug!(
            conversation_id = %conversation_id,
            pending_action = ?state.pending_action(),
            "Handling chat turn"
        );

        let outcome = match state {
            DialogueState::Idle => {
                let command = self.classifier.classify(message).await?;
                self.machine.start(command)
            }
            DialogueState::AwaitingField { draft, missing } => {
                self.machine.answer_field(draft, missing, message)
            }
            DialogueState::AwaitingConfirmation(pending) => self.machine.confirm(pending, message),
        };

        let (reply, data, next) = match outcome {
            Outcome::Reply { reply, next } => (reply, None, next),
            Outcome::Query(query) => {
                let (reply, sales) = self.dispatcher.query(query).await?;
                (reply, Some(sales), DialogueState::Idle)
            }
            Outcome::Execute(pending) => {
                let reply = self.dispatcher.execute(pending).await;
                (reply, None, DialogueState::Idle)
            }
        };

        let pending_action = next.pending_action();
        if next.is_idle() {
            self.sessions.delete(&conversation_id).await?;
        } else {
            self.sessions.put(&conversation_id, next).await?;
        }

        tracing::info!(
            conversation_id = %conversation_id,
            pending_action = ?pending_action,
            "Chat turn complete"
        );

        Ok(ChatReply {
            reply,
            data,
            conversation_id,
            pending_action,
        })
    }
}
