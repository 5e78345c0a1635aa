//! Command dispatcher
//!
//! Runs read-only queries and confirmed mutations against the [`SalesStore`]
//! and renders the Thai replies.

use std::sync::Arc;

use buffet_pos_config::{fill_template, ResponseTemplates};
use buffet_pos_core::{Sale, SalesStore, StoreError};

use crate::dialogue::SalesQuery;
use crate::state::PendingCommand;
use crate::AgentError;

const TABLE_HEADER: &str = "ID | Date       | Table | Cust | Buffet   | Price/P | Payment  | Total\n";
const TABLE_SEPARATOR: &str = "---|------------|-------|------|----------|---------|----------|-------\n";

/// Fixed-width text table of sales
pub fn format_sales_table(sales: &[Sale]) -> String {
    let rows = sales
        .iter()
        .map(|s| {
            format!(
                "{:<2} | {:<10} | {:<5} | {:<4} | {:<8} | {:<7} | {:<8} | {}",
                s.id,
                s.date,
                s.table_number,
                s.customer_count,
                s.buffet_type,
                s.price_per_person,
                s.payment_method,
                s.total_amount
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!("{}{}{}", TABLE_HEADER, TABLE_SEPARATOR, rows)
}

/// `1234567` → `"1,234,567"`
pub fn format_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub struct CommandDispatcher {
    store: Arc<dyn SalesStore>,
    templates: ResponseTemplates,
}

impl CommandDispatcher {
    pub fn new(store: Arc<dyn SalesStore>, templates: ResponseTemplates) -> Self {
        Self { store, templates }
    }

    /// Answer a read-only query; store failures propagate
    pub async fn query(&self, query: SalesQuery) -> Result<(String, Vec<Sale>), AgentError> {
        match query {
            SalesQuery::All => {
                let sales = self.store.list(None).await?;
                let reply = if sales.is_empty() {
                    self.templates.no_sales.clone()
                } else {
                    format!(
                        "{}\n```\n{}\n```",
                        self.templates.sales_list_header,
                        format_sales_table(&sales)
                    )
                };
                tracing::debug!(count = sales.len(), "Listed sales");
                Ok((reply, sales))
            }
            SalesQuery::Range(range) => {
                let sales = self.store.list(Some(range)).await?;
                let start = range.start_date.format("%Y-%m-%d").to_string();
                let end = range.end_date.format("%Y-%m-%d").to_string();

                if sales.is_empty() {
                    let reply = fill_template(
                        &self.templates.analysis_empty,
                        &[("start", start.as_str()), ("end", end.as_str())],
                    );
                    return Ok((reply, sales));
                }

                let revenue: u64 = sales.iter().map(|s| s.total_amount).sum();
                let customers: u64 = sales.iter().map(|s| u64::from(s.customer_count)).sum();
                let reply = fill_template(
                    &self.templates.analysis_summary,
                    &[
                        ("start", start.as_str()),
                        ("end", end.as_str()),
                        ("bills", sales.len().to_string().as_str()),
                        ("customers", customers.to_string().as_str()),
                        ("revenue", format_thousands(revenue).as_str()),
                    ],
                );
                tracing::debug!(bills = sales.len(), revenue, "Analyzed sales");
                Ok((reply, sales))
            }
        }
    }

    /// Run a confirmed mutation; failures become a localized reply
    pub async fn execute(&self, pending: PendingCommand) -> String {
        let action = pending.kind();
        let result = match pending {
            PendingCommand::AddSale(sale) => self
                .store
                .create(sale)
                .await
                .map(|created| (created.id, &self.templates.add_success)),
            PendingCommand::UpdateSale { id, updates } => self
                .store
                .update(id, updates)
                .await
                .map(|_| (id, &self.templates.update_success)),
            PendingCommand::DeleteSale { id } => self
                .store
                .delete(id)
                .await
                .map(|_| (id, &self.templates.delete_success)),
        };

        match result {
            Ok((id, template)) => {
                tracing::info!(action = %action, sale_id = id, store = self.store.name(), "Sales action completed");
                fill_template(template, &[("id", id.to_string().as_str())])
            }
            Err(err) => {
                tracing::warn!(action = %action, error = %err, "Sales action failed");
                self.describe_failure(&err)
            }
        }
    }

    fn describe_failure(&self, err: &StoreError) -> String {
        match err {
            StoreError::NotFound(id) => {
                fill_template(&self.templates.not_found, &[("id", id.to_string().as_str())])
            }
            other => fill_template(
                &self.templates.action_failed,
                &[("detail", other.to_string().as_str())],
            ),
        }
    }
}
