//! Commands produced by the intent classifier
//!
//! The oracle answers with a loosely shaped JSON object:
//!
//! ```json
//! {"action": "ADD_SALE", "parameters": {"tableNumber": 5}, "reply": "..."}
//! ```
//!
//! [`Command::from_json`] validates it into the closed [`Command`] enum. Any
//! shape outside the schema is rejected with a [`CommandError`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::draft::SaleDraft;
use crate::lenient;
use crate::sale::{DateRange, SaleId, SalePatch};

/// Command discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandKind {
    GetSales,
    AnalyzeSales,
    AddSale,
    UpdateSale,
    DeleteSale,
    GeneralQuery,
    Unknown,
}

impl CommandKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::GetSales => "GET_SALES",
            CommandKind::AnalyzeSales => "ANALYZE_SALES",
            CommandKind::AddSale => "ADD_SALE",
            CommandKind::UpdateSale => "UPDATE_SALE",
            CommandKind::DeleteSale => "DELETE_SALE",
            CommandKind::GeneralQuery => "GENERAL_QUERY",
            CommandKind::Unknown => "UNKNOWN",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET_SALES" => Some(CommandKind::GetSales),
            "ANALYZE_SALES" => Some(CommandKind::AnalyzeSales),
            "ADD_SALE" => Some(CommandKind::AddSale),
            "UPDATE_SALE" => Some(CommandKind::UpdateSale),
            "DELETE_SALE" => Some(CommandKind::DeleteSale),
            "GENERAL_QUERY" => Some(CommandKind::GeneralQuery),
            "UNKNOWN" => Some(CommandKind::Unknown),
            _ => None,
        }
    }
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Oracle output does not match the command schema
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("not valid JSON: {0}")]
    InvalidJson(String),

    #[error("missing command discriminant")]
    MissingAction,

    #[error("unrecognized command: {0}")]
    UnknownAction(String),

    #[error("invalid parameters for {kind}: {message}")]
    InvalidParameters { kind: CommandKind, message: String },
}

/// A validated command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    GetSales,
    AnalyzeSales(DateRange),
    AddSale(SaleDraft),
    UpdateSale { id: SaleId, updates: SalePatch },
    DeleteSale { id: SaleId },
    GeneralQuery { reply: Option<String> },
    Unknown { reply: Option<String> },
}

#[derive(Deserialize)]
struct RawCommand {
    #[serde(alias = "kind")]
    action: Option<String>,
    #[serde(default)]
    parameters: Option<Value>,
    #[serde(default)]
    reply: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeParams {
    start_date: String,
    end_date: String,
}

#[derive(Deserialize)]
struct IdParams {
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    id: Option<u64>,
    #[serde(default)]
    updates: Option<SalePatch>,
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::GetSales => CommandKind::GetSales,
            Command::AnalyzeSales(_) => CommandKind::AnalyzeSales,
            Command::AddSale(_) => CommandKind::AddSale,
            Command::UpdateSale { .. } => CommandKind::UpdateSale,
            Command::DeleteSale { .. } => CommandKind::DeleteSale,
            Command::GeneralQuery { .. } => CommandKind::GeneralQuery,
            Command::Unknown { .. } => CommandKind::Unknown,
        }
    }

    /// Parse and validate a JSON command
    pub fn from_json(text: &str) -> Result<Self, CommandError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| CommandError::InvalidJson(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, CommandError> {
        if !value.is_object() {
            return Err(CommandError::InvalidJson(
                "expected a JSON object".to_string(),
            ));
        }
        let raw: RawCommand =
            serde_json::from_value(value).map_err(|e| CommandError::InvalidJson(e.to_string()))?;
        let action = raw.action.ok_or(CommandError::MissingAction)?;
        let kind =
            CommandKind::parse(&action).ok_or_else(|| CommandError::UnknownAction(action.clone()))?;
        let reply = raw.reply.filter(|r| !r.trim().is_empty());
        let params = raw.parameters.filter(|p| !p.is_null());

        let invalid = |message: String| CommandError::InvalidParameters { kind, message };

        match kind {
            CommandKind::GetSales => Ok(Command::GetSales),
            CommandKind::AnalyzeSales => {
                let params = params.ok_or_else(|| invalid("missing parameters".to_string()))?;
                let p: AnalyzeParams =
                    serde_json::from_value(params).map_err(|e| invalid(e.to_string()))?;
                let range = DateRange::parse(&p.start_date, &p.end_date).ok_or_else(|| {
                    invalid(format!(
                        "dates must be YYYY-MM-DD, got {} .. {}",
                        p.start_date, p.end_date
                    ))
                })?;
                Ok(Command::AnalyzeSales(range))
            }
            CommandKind::AddSale => {
                let draft = match params {
                    Some(p) => serde_json::from_value(p).map_err(|e| invalid(e.to_string()))?,
                    None => SaleDraft::default(),
                };
                Ok(Command::AddSale(draft))
            }
            CommandKind::UpdateSale | CommandKind::DeleteSale => {
                let params = params.ok_or_else(|| invalid("missing parameters".to_string()))?;
                let p: IdParams =
                    serde_json::from_value(params).map_err(|e| invalid(e.to_string()))?;
                let id = p
                    .id
                    .filter(|id| *id > 0)
                    .ok_or_else(|| invalid("missing sale id".to_string()))?;
                if kind == CommandKind::DeleteSale {
                    Ok(Command::DeleteSale { id })
                } else {
                    Ok(Command::UpdateSale {
                        id,
                        updates: p.updates.unwrap_or_default(),
                    })
                }
            }
            CommandKind::GeneralQuery => Ok(Command::GeneralQuery { reply }),
            CommandKind::Unknown => Ok(Command::Unknown { reply }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_get_sales() {
        let cmd = Command::from_json(r#"{"action": "GET_SALES"}"#).unwrap();
        assert_eq!(cmd, Command::GetSales);
    }

    #[test]
    fn test_kind_alias() {
        let cmd = Command::from_json(r#"{"kind": "get_sales"}"#).unwrap();
        assert_eq!(cmd.kind(), CommandKind::GetSales);
    }

    #[test]
    fn test_analyze_sales() {
        let cmd = Command::from_json(
            r#"{"action": "ANALYZE_SALES", "parameters": {"startDate": "2025-01-01", "endDate": "2025-01-31"}}"#,
        )
        .unwrap();
        match cmd {
            Command::AnalyzeSales(range) => {
                assert_eq!(range.start_date, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
                assert_eq!(range.end_date, NaiveDate::from_ymd_opt(2025, 1, 31).unwrap());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_analyze_sales_bad_dates() {
        let err = Command::from_json(
            r#"{"action": "ANALYZE_SALES", "parameters": {"startDate": "last week", "endDate": "2025-01-31"}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, CommandError::InvalidParameters { kind: CommandKind::AnalyzeSales, .. }));
    }

    #[test]
    fn test_add_sale_partial() {
        let cmd = Command::from_json(
            r#"{"action": "ADD_SALE", "parameters": {"tableNumber": 5, "customerCount": 4, "buffetType": "พรีเมียม"}}"#,
        )
        .unwrap();
        let Command::AddSale(draft) = cmd else {
            panic!("expected ADD_SALE");
        };
        assert_eq!(draft.table_number, Some(5));
        assert_eq!(draft.buffet_type.as_deref(), Some("พรีเมียม"));
        assert_eq!(draft.date, None);
    }

    #[test]
    fn test_add_sale_wrong_types() {
        let err = Command::from_json(
            r#"{"action": "ADD_SALE", "parameters": {"tableNumber": "window seat"}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, CommandError::InvalidParameters { .. }));
    }

    #[test]
    fn test_update_and_delete() {
        let cmd = Command::from_json(
            r#"{"action": "UPDATE_SALE", "parameters": {"id": "12", "updates": {"tableNumber": 5}}}"#,
        )
        .unwrap();
        assert_eq!(
            cmd,
            Command::UpdateSale {
                id: 12,
                updates: SalePatch {
                    table_number: Some(5),
                    ..Default::default()
                }
            }
        );

        let cmd = Command::from_json(r#"{"action": "DELETE_SALE", "parameters": {"id": 7}}"#).unwrap();
        assert_eq!(cmd, Command::DeleteSale { id: 7 });

        let err = Command::from_json(r#"{"action": "DELETE_SALE", "parameters": {}}"#).unwrap_err();
        assert!(matches!(err, CommandError::InvalidParameters { .. }));
    }

    #[test]
    fn test_reply_passthrough() {
        let cmd = Command::from_json(r#"{"action": "GENERAL_QUERY", "reply": "สวัสดีค่ะ"}"#).unwrap();
        assert_eq!(
            cmd,
            Command::GeneralQuery {
                reply: Some("สวัสดีค่ะ".to_string())
            }
        );
        let cmd = Command::from_json(r#"{"action": "UNKNOWN", "reply": ""}"#).unwrap();
        assert_eq!(cmd, Command::Unknown { reply: None });
    }

    #[test]
    fn test_malformed_shapes() {
        assert!(matches!(Command::from_json("not json"), Err(CommandError::InvalidJson(_))));
        assert!(matches!(Command::from_json("[1, 2]"), Err(CommandError::InvalidJson(_))));
        assert!(matches!(Command::from_json("{}"), Err(CommandError::MissingAction)));
        assert!(matches!(
            Command::from_json(r#"{"action": "ORDER_PIZZA"}"#),
            Err(CommandError::UnknownAction(_))
        ));
    }
}
