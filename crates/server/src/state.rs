//! Application State
//!
//! Shared state across all handlers.

use std::sync::Arc;

use buffet_pos_agent::{DialogueSessionStore, InMemoryDialogueStore, SalesAssistant};
use buffet_pos_config::{DomainConfig, Settings};
use buffet_pos_core::SalesStore;
use buffet_pos_llm::LlmBackend;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    /// Chat turn handler (classifier, dialogue, dispatcher, sessions)
    pub assistant: Arc<SalesAssistant>,
    /// Sales records, shared with the assistant
    pub sales: Arc<dyn SalesStore>,
    /// Oracle backend, kept for readiness checks
    pub llm: Arc<dyn LlmBackend>,
}

impl AppState {
    /// Create application state with an in-memory dialogue session store
    pub fn new(
        config: Settings,
        domain: DomainConfig,
        llm: Arc<dyn LlmBackend>,
        sales: Arc<dyn SalesStore>,
    ) -> Self {
        Self::with_session_store(
            config,
            domain,
            llm,
            sales,
            Arc::new(InMemoryDialogueStore::new()),
        )
    }

    pub fn with_session_store(
        config: Settings,
        domain: DomainConfig,
        llm: Arc<dyn LlmBackend>,
        sales: Arc<dyn SalesStore>,
        sessions: Arc<dyn DialogueSessionStore>,
    ) -> Self {
        let assistant = SalesAssistant::new(
            llm.clone(),
            sales.clone(),
            sessions,
            &domain,
            &config.dialogue,
        );
        Self {
            config: Arc::new(config),
            assistant: Arc::new(assistant),
            sales,
            llm,
        }
    }

    pub fn sessions(&self) -> &Arc<dyn DialogueSessionStore> {
        self.assistant.sessions()
    }
}
