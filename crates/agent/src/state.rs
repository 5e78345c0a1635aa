//! Per-conversation dialogue state

use buffet_pos_core::{CommandKind, NewSale, SaleDraft, SaleField, SaleId, SalePatch};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What the conversation is waiting for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PendingAction {
    AddSaleMissingInfo,
    AddSaleConfirmation,
    UpdateSaleConfirmation,
    DeleteSaleConfirmation,
}

/// A fully specified store mutation waiting for a yes/no
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingCommand {
    AddSale(NewSale),
    UpdateSale { id: SaleId, updates: SalePatch },
    DeleteSale { id: SaleId },
}

impl PendingCommand {
    pub fn kind(&self) -> CommandKind {
        match self {
            PendingCommand::AddSale(_) => CommandKind::AddSale,
            PendingCommand::UpdateSale { .. } => CommandKind::UpdateSale,
            PendingCommand::DeleteSale { .. } => CommandKind::DeleteSale,
        }
    }
}

/// Dialogue state between turns; absent from the session store means `Idle`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DialogueState {
    #[default]
    Idle,
    /// Collecting the fields of a new sale; `missing[0]` is asked next
    AwaitingField {
        draft: SaleDraft,
        missing: Vec<SaleField>,
    },
    AwaitingConfirmation(PendingCommand),
}

impl DialogueState {
    pub fn is_idle(&self) -> bool {
        matches!(self, DialogueState::Idle)
    }

    pub fn pending_action(&self) -> Option<PendingAction> {
        match self {
            DialogueState::Idle => None,
            DialogueState::AwaitingField { .. } => Some(PendingAction::AddSaleMissingInfo),
            DialogueState::AwaitingConfirmation(PendingCommand::AddSale(_)) => {
                Some(PendingAction::AddSaleConfirmation)
            }
            DialogueState::AwaitingConfirmation(PendingCommand::UpdateSale { .. }) => {
                Some(PendingAction::UpdateSaleConfirmation)
            }
            DialogueState::AwaitingConfirmation(PendingCommand::DeleteSale { .. }) => {
                Some(PendingAction::DeleteSaleConfirmation)
            }
        }
    }

    /// Action awaiting confirmation, if any
    pub fn action(&self) -> Option<CommandKind> {
        match self {
            DialogueState::AwaitingConfirmation(pending) => Some(pending.kind()),
            _ => None,
        }
    }

    pub fn missing_fields(&self) -> &[SaleField] {
        match self {
            DialogueState::AwaitingField { missing, .. } => missing,
            _ => &[],
        }
    }

    /// Serializable view for inspection endpoints
    pub fn snapshot(&self) -> ConversationSnapshot {
        let data = match self {
            DialogueState::Idle => Value::Null,
            DialogueState::AwaitingField { draft, .. } => to_value(draft),
            DialogueState::AwaitingConfirmation(PendingCommand::AddSale(sale)) => to_value(sale),
            DialogueState::AwaitingConfirmation(PendingCommand::UpdateSale { id, updates }) => {
                serde_json::json!({ "id": id, "updates": to_value(updates) })
            }
            DialogueState::AwaitingConfirmation(PendingCommand::DeleteSale { id }) => {
                serde_json::json!({ "id": id })
            }
        };
        ConversationSnapshot {
            pending_action: self.pending_action(),
            action: self.action(),
            data,
            missing_fields: self.missing_fields().to_vec(),
        }
    }
}

fn to_value<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSnapshot {
    pub pending_action: Option<PendingAction>,
    pub action: Option<CommandKind>,
    pub data: Value,
    pub missing_fields: Vec<SaleField>,
}
