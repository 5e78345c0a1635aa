//! Slot-filling state machine
//!
//! Pure transitions: given the current state and the user's text, decide the
//! reply and the next state, or hand a query/mutation to the dispatcher. No
//! I/O happens here.
//!
//! ```text
//! Idle ──ADD_SALE, fields missing──▶ AwaitingField ──answer──▶ AwaitingField
//!   │                                      │
//!   │ ADD_SALE complete / UPDATE / DELETE  │ all fields present
//!   ▼                                      ▼
//! AwaitingConfirmation ◀───────────────────┘
//!   │ yes → Execute, anything else → cancelled
//!   ▼
//! Idle
//! ```

use buffet_pos_config::{fill_template, DomainConfig, ResponseTemplates};
use buffet_pos_core::{Command, DateRange, PricingTable, SaleDraft, SaleField, SaleId, SalePatch};

use crate::state::{DialogueState, PendingCommand};

/// Read-only query answered in a single turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SalesQuery {
    All,
    Range(DateRange),
}

/// Result of one transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Answer with `reply` and store `next`
    Reply { reply: String, next: DialogueState },
    /// Run a read-only query; the conversation stays idle
    Query(SalesQuery),
    /// The user confirmed; run the mutation and return to idle
    Execute(PendingCommand),
}

pub struct DialogueMachine {
    pricing: PricingTable,
    templates: ResponseTemplates,
}

impl DialogueMachine {
    pub fn new(pricing: PricingTable, templates: ResponseTemplates) -> Self {
        Self { pricing, templates }
    }

    pub fn from_domain(domain: &DomainConfig) -> Self {
        Self::new(domain.pricing.clone(), domain.responses.clone())
    }

    pub fn templates(&self) -> &ResponseTemplates {
        &self.templates
    }

    /// Transition out of `Idle` on a freshly classified command
    pub fn start(&self, command: Command) -> Outcome {
        match command {
            Command::GetSales => Outcome::Query(SalesQuery::All),
            Command::AnalyzeSales(range) => Outcome::Query(SalesQuery::Range(range)),
            Command::AddSale(mut draft) => {
                draft.derive_price(&self.pricing);
                self.prompt_or_confirm(draft, &self.templates.missing_fields_initial)
            }
            Command::UpdateSale { id, updates } => Outcome::Reply {
                reply: self.update_prompt(id, &updates),
                next: DialogueState::AwaitingConfirmation(PendingCommand::UpdateSale {
                    id,
                    updates,
                }),
            },
            Command::DeleteSale { id } => Outcome::Reply {
                reply: fill_template(
                    &self.templates.delete_confirmation,
                    &[("id", id.to_string().as_str())],
                ),
                next: DialogueState::AwaitingConfirmation(PendingCommand::DeleteSale { id }),
            },
            Command::GeneralQuery { reply } | Command::Unknown { reply } => Outcome::Reply {
                reply: reply.unwrap_or_else(|| self.templates.fallback.clone()),
                next: DialogueState::Idle,
            },
        }
    }

    /// Consume `answer` as the literal value of the next missing field
    pub fn answer_field(&self, draft: SaleDraft, missing: Vec<SaleField>, answer: &str) -> Outcome {
        let Some(&field) = missing.first() else {
            return self.prompt_or_confirm(draft, &self.templates.missing_fields_followup);
        };

        let mut updated = draft.clone();
        if let Err(err) = updated.set_field(field, answer) {
            tracing::debug!(field = %err.field, value = %err.value, "Rejected field answer");
            let template = if field.is_numeric() {
                &self.templates.invalid_number
            } else {
                &self.templates.invalid_value
            };
            return Outcome::Reply {
                reply: fill_template(template, &[("field", field.label())]),
                next: DialogueState::AwaitingField { draft, missing },
            };
        }

        updated.derive_price(&self.pricing);
        self.prompt_or_confirm(updated, &self.templates.missing_fields_followup)
    }

    /// Consume `answer` as a yes/no for the pending command
    pub fn confirm(&self, pending: PendingCommand, answer: &str) -> Outcome {
        if self.templates.is_affirmative(answer) {
            Outcome::Execute(pending)
        } else {
            tracing::debug!(action = %pending.kind(), "Pending action declined");
            Outcome::Reply {
                reply: self.templates.cancelled.clone(),
                next: DialogueState::Idle,
            }
        }
    }

    fn prompt_or_confirm(&self, draft: SaleDraft, missing_template: &str) -> Outcome {
        let missing = draft.missing_fields();
        if !missing.is_empty() {
            let fields = missing
                .iter()
                .map(|f| f.label())
                .collect::<Vec<_>>()
                .join(", ");
            return Outcome::Reply {
                reply: fill_template(missing_template, &[("fields", fields.as_str())]),
                next: DialogueState::AwaitingField { draft, missing },
            };
        }

        match draft.to_new_sale() {
            Some(sale) => {
                let reply = fill_template(
                    &self.templates.add_confirmation,
                    &[
                        ("date", sale.date.as_str()),
                        ("table_number", sale.table_number.to_string().as_str()),
                        ("customer_count", sale.customer_count.to_string().as_str()),
                        ("buffet_type", sale.buffet_type.as_str()),
                        ("price_per_person", sale.price_per_person.to_string().as_str()),
                        ("payment_method", sale.payment_method.as_str()),
                        ("total_amount", sale.total_amount.to_string().as_str()),
                    ],
                );
                Outcome::Reply {
                    reply,
                    next: DialogueState::AwaitingConfirmation(PendingCommand::AddSale(sale)),
                }
            }
            None => Outcome::Reply {
                reply: self.templates.fallback.clone(),
                next: DialogueState::Idle,
            },
        }
    }

    fn update_prompt(&self, id: SaleId, updates: &SalePatch) -> String {
        let id = id.to_string();
        if updates.is_empty() {
            return fill_template(
                &self.templates.update_confirmation_no_changes,
                &[("id", id.as_str())],
            );
        }
        let changes = updates
            .describe()
            .into_iter()
            .map(|(name, value)| format!("{} {}", field_label(name), value))
            .collect::<Vec<_>>()
            .join(", ");
        fill_template(
            &self.templates.update_confirmation,
            &[("id", id.as_str()), ("changes", changes.as_str())],
        )
    }
}

fn field_label(wire_name: &str) -> &str {
    SaleField::REQUIRED
        .iter()
        .find(|f| f.as_str() == wire_name)
        .map(|f| f.label())
        .unwrap_or(match wire_name {
            "totalAmount" => "ยอดรวม",
            other => other,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use buffet_pos_core::NewSale;

    fn machine() -> DialogueMachine {
        DialogueMachine::from_domain(&DomainConfig::default())
    }

    fn full_draft() -> SaleDraft {
        SaleDraft {
            date: Some("2025-01-15".to_string()),
            table_number: Some(5),
            customer_count: Some(4),
            buffet_type: Some("premium".to_string()),
            price_per_person: None,
            payment_method: Some("cash".to_string()),
        }
    }

    fn expect_reply(outcome: Outcome) -> (String, DialogueState) {
        match outcome {
            Outcome::Reply { reply, next } => (reply, next),
            other => panic!("expected a reply, got {other:?}"),
        }
    }

    #[test]
    fn test_direct_queries() {
        let m = machine();
        assert_eq!(m.start(Command::GetSales), Outcome::Query(SalesQuery::All));
        let range = DateRange::parse("2025-01-01", "2025-01-31").unwrap();
        assert_eq!(
            m.start(Command::AnalyzeSales(range)),
            Outcome::Query(SalesQuery::Range(range))
        );
    }

    #[test]
    fn test_complete_add_goes_to_confirmation() {
        let (reply, next) = expect_reply(machine().start(Command::AddSale(full_draft())));
        assert!(reply.contains("1596"));
        assert!(reply.contains("(ใช่/ไม่)"));
        match next {
            DialogueState::AwaitingConfirmation(PendingCommand::AddSale(sale)) => {
                assert_eq!(sale.price_per_person, 399);
                assert_eq!(sale.total_amount, 1596);
            }
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[test]
    fn test_each_single_missing_field_is_named() {
        let m = machine();
        for field in SaleField::REQUIRED {
            let mut draft = full_draft();
            draft.price_per_person = Some(399);
            match field {
                SaleField::Date => draft.date = None,
                SaleField::TableNumber => draft.table_number = None,
                SaleField::CustomerCount => draft.customer_count = None,
                SaleField::BuffetType => draft.buffet_type = None,
                SaleField::PricePerPerson => {
                    draft.price_per_person = None;
                    draft.buffet_type = Some("unknowntier".to_string());
                }
                SaleField::PaymentMethod => draft.payment_method = None,
            }

            let (reply, next) = expect_reply(m.start(Command::AddSale(draft)));
            let expected = fill_template(
                &m.templates().missing_fields_initial,
                &[("fields", field.label())],
            );
            assert_eq!(reply, expected, "field {field}");
            assert_eq!(next.missing_fields(), &[field]);
        }
    }

    #[test]
    fn test_vip_price_derived() {
        let draft = SaleDraft {
            buffet_type: Some("vip".to_string()),
            ..Default::default()
        };
        let (_, next) = expect_reply(machine().start(Command::AddSale(draft)));
        let DialogueState::AwaitingField { draft, missing } = next else {
            panic!("expected AwaitingField");
        };
        assert_eq!(draft.price_per_person, Some(599));
        assert!(!missing.contains(&SaleField::PricePerPerson));
    }

    #[test]
    fn test_non_numeric_answer_keeps_state() {
        let m = machine();
        let draft = SaleDraft::default();
        let missing = draft.missing_fields();
        let missing_after_date = vec![SaleField::TableNumber, SaleField::CustomerCount];

        let (reply, next) = expect_reply(m.answer_field(
            draft.clone(),
            missing_after_date.clone(),
            "ริมหน้าต่าง",
        ));
        assert!(reply.contains("หมายเลขโต๊ะ"));
        assert_eq!(
            next,
            DialogueState::AwaitingField {
                draft: draft.clone(),
                missing: missing_after_date
            }
        );

        // text fields are stored verbatim
        let (_, next) = expect_reply(m.answer_field(draft, missing, "15"));
        let DialogueState::AwaitingField { draft, .. } = next else {
            panic!("expected AwaitingField");
        };
        assert_eq!(draft.date.as_deref(), Some("15"));
    }

    #[test]
    fn test_delayed_buffet_answer_does_not_overwrite_price() {
        let m = machine();
        let mut draft = full_draft();
        draft.buffet_type = None;
        draft.price_per_person = Some(450);

        let (_, next) = expect_reply(m.answer_field(draft, vec![SaleField::BuffetType], "vip"));
        match next {
            DialogueState::AwaitingConfirmation(PendingCommand::AddSale(sale)) => {
                assert_eq!(sale.price_per_person, 450);
                assert_eq!(sale.total_amount, 4 * 450);
            }
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[test]
    fn test_delayed_buffet_answer_derives_price() {
        let m = machine();
        let mut draft = full_draft();
        draft.buffet_type = None;

        let (_, next) = expect_reply(m.answer_field(
            draft,
            vec![SaleField::BuffetType, SaleField::PricePerPerson],
            "วีไอพี",
        ));
        let DialogueState::AwaitingConfirmation(PendingCommand::AddSale(sale)) = next else {
            panic!("expected confirmation");
        };
        assert_eq!(sale.price_per_person, 599);
    }

    #[test]
    fn test_update_and_delete_confirm_directly() {
        let m = machine();
        let updates = SalePatch {
            table_number: Some(5),
            ..Default::default()
        };
        let (reply, next) = expect_reply(m.start(Command::UpdateSale { id: 12, updates }));
        assert!(reply.contains("12"));
        assert!(reply.contains("หมายเลขโต๊ะ 5"));
        assert_eq!(next.action(), Some(buffet_pos_core::CommandKind::UpdateSale));

        let (reply, next) = expect_reply(m.start(Command::DeleteSale { id: 7 }));
        assert!(reply.contains("ID 7"));
        assert_eq!(
            next,
            DialogueState::AwaitingConfirmation(PendingCommand::DeleteSale { id: 7 })
        );
    }

    #[test]
    fn test_confirm_and_decline() {
        let m = machine();
        let pending = PendingCommand::AddSale(NewSale {
            date: "2025-01-15".to_string(),
            table_number: 5,
            customer_count: 4,
            buffet_type: "premium".to_string(),
            price_per_person: 399,
            payment_method: "cash".to_string(),
            total_amount: 1596,
        });

        assert_eq!(
            m.confirm(pending.clone(), "ใช่ค่ะ"),
            Outcome::Execute(pending.clone())
        );
        let (reply, next) = expect_reply(m.confirm(pending.clone(), "ไม่"));
        assert_eq!(reply, m.templates().cancelled);
        assert!(next.is_idle());

        // off-topic answers decline
        let (_, next) = expect_reply(m.confirm(pending, "ราคารวมเท่าไหร่"));
        assert!(next.is_idle());
    }

    #[test]
    fn test_general_query_and_unknown_replies() {
        let m = machine();
        let (reply, next) = expect_reply(m.start(Command::GeneralQuery {
            reply: Some("สวัสดีค่ะ".to_string()),
        }));
        assert_eq!(reply, "สวัสดีค่ะ");
        assert!(next.is_idle());

        let (reply, _) = expect_reply(m.start(Command::Unknown { reply: None }));
        assert_eq!(reply, m.templates().fallback);
    }
}
