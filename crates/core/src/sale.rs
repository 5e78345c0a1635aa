//! Sale records
//!
//! Field names serialize as camelCase, matching the JSON the web frontend
//! and the oracle exchange.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::lenient;

pub type SaleId = u64;

/// Date format used for sale dates and range filters
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A persisted sale (one bill)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: SaleId,
    pub date: String,
    pub table_number: u32,
    pub customer_count: u32,
    pub buffet_type: String,
    pub price_per_person: u32,
    pub payment_method: String,
    pub total_amount: u64,
}

impl Sale {
    /// Build a persisted record from a creation payload
    pub fn from_new(id: SaleId, new: NewSale) -> Self {
        Self {
            id,
            date: new.date,
            table_number: new.table_number,
            customer_count: new.customer_count,
            buffet_type: new.buffet_type,
            price_per_person: new.price_per_person,
            payment_method: new.payment_method,
            total_amount: new.total_amount,
        }
    }

    /// Parsed sale date, if it is in `YYYY-MM-DD` form
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.date.trim(), DATE_FORMAT).ok()
    }

    /// Apply a partial update
    ///
    /// `total_amount` is recomputed from the patched count and price unless
    /// the patch sets it explicitly.
    pub fn apply(&mut self, patch: &SalePatch) {
        if let Some(date) = &patch.date {
            self.date = date.clone();
        }
        if let Some(table) = patch.table_number {
            self.table_number = table;
        }
        if let Some(count) = patch.customer_count {
            self.customer_count = count;
        }
        if let Some(buffet) = &patch.buffet_type {
            self.buffet_type = buffet.clone();
        }
        if let Some(price) = patch.price_per_person {
            self.price_per_person = price;
        }
        if let Some(method) = &patch.payment_method {
            self.payment_method = method.clone();
        }
        self.total_amount = match patch.total_amount {
            Some(total) => total,
            None if patch.customer_count.is_some() || patch.price_per_person.is_some() => {
                u64::from(self.customer_count) * u64::from(self.price_per_person)
            }
            None => self.total_amount,
        };
    }
}

/// Payload for creating a sale (no id yet)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSale {
    pub date: String,
    pub table_number: u32,
    pub customer_count: u32,
    pub buffet_type: String,
    pub price_per_person: u32,
    pub payment_method: String,
    pub total_amount: u64,
}

impl NewSale {
    pub fn expected_total(&self) -> u64 {
        u64::from(self.customer_count) * u64::from(self.price_per_person)
    }
}

/// Partial update; absent fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SalePatch {
    #[serde(
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<String>,
    #[serde(
        deserialize_with = "lenient::opt_u32",
        skip_serializing_if = "Option::is_none"
    )]
    pub table_number: Option<u32>,
    #[serde(
        deserialize_with = "lenient::opt_u32",
        skip_serializing_if = "Option::is_none"
    )]
    pub customer_count: Option<u32>,
    #[serde(
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub buffet_type: Option<String>,
    #[serde(
        deserialize_with = "lenient::opt_u32",
        skip_serializing_if = "Option::is_none"
    )]
    pub price_per_person: Option<u32>,
    #[serde(
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub payment_method: Option<String>,
    #[serde(
        deserialize_with = "lenient::opt_u64",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_amount: Option<u64>,
}

impl SalePatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// `field=value` pairs for the fields this patch sets, in schema order
    pub fn describe(&self) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        if let Some(v) = &self.date {
            out.push(("date", v.clone()));
        }
        if let Some(v) = self.table_number {
            out.push(("tableNumber", v.to_string()));
        }
        if let Some(v) = self.customer_count {
            out.push(("customerCount", v.to_string()));
        }
        if let Some(v) = &self.buffet_type {
            out.push(("buffetType", v.clone()));
        }
        if let Some(v) = self.price_per_person {
            out.push(("pricePerPerson", v.to_string()));
        }
        if let Some(v) = &self.payment_method {
            out.push(("paymentMethod", v.clone()));
        }
        if let Some(v) = self.total_amount {
            out.push(("totalAmount", v.to_string()));
        }
        out
    }
}

/// Inclusive date range used by the analysis command and the list filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl DateRange {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
        }
    }

    /// Parse both ends from `YYYY-MM-DD` strings
    pub fn parse(start: &str, end: &str) -> Option<Self> {
        let start_date = NaiveDate::parse_from_str(start.trim(), DATE_FORMAT).ok()?;
        let end_date = NaiveDate::parse_from_str(end.trim(), DATE_FORMAT).ok()?;
        Some(Self::new(start_date, end_date))
    }

    /// Both ends inclusive; the whole end day counts
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Sale {
        Sale {
            id: 1,
            date: "2025-01-15".to_string(),
            table_number: 5,
            customer_count: 4,
            buffet_type: "premium".to_string(),
            price_per_person: 399,
            payment_method: "cash".to_string(),
            total_amount: 1596,
        }
    }

    #[test]
    fn test_camel_case_json() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["tableNumber"], 5);
        assert_eq!(json["totalAmount"], 1596);
        assert_eq!(json["buffetType"], "premium");
    }

    #[test]
    fn test_apply_patch_recomputes_total() {
        let mut sale = sample();
        let patch: SalePatch = serde_json::from_str(r#"{"customerCount": "3"}"#).unwrap();
        sale.apply(&patch);
        assert_eq!(sale.customer_count, 3);
        assert_eq!(sale.total_amount, 3 * 399);
        assert_eq!(sale.table_number, 5);
    }

    #[test]
    fn test_apply_patch_explicit_total_wins() {
        let mut sale = sample();
        let patch = SalePatch {
            price_per_person: Some(599),
            total_amount: Some(2000),
            ..Default::default()
        };
        sale.apply(&patch);
        assert_eq!(sale.price_per_person, 599);
        assert_eq!(sale.total_amount, 2000);
    }

    #[test]
    fn test_patch_without_pricing_keeps_total() {
        let mut sale = sample();
        sale.apply(&SalePatch {
            table_number: Some(9),
            ..Default::default()
        });
        assert_eq!(sale.table_number, 9);
        assert_eq!(sale.total_amount, 1596);
    }

    #[test]
    fn test_patch_describe_and_empty() {
        assert!(SalePatch::default().is_empty());
        let patch = SalePatch {
            table_number: Some(5),
            payment_method: Some("qr".to_string()),
            ..Default::default()
        };
        assert!(!patch.is_empty());
        assert_eq!(
            patch.describe(),
            vec![("tableNumber", "5".to_string()), ("paymentMethod", "qr".to_string())]
        );
    }

    #[test]
    fn test_date_range_inclusive() {
        let range = DateRange::parse("2025-01-01", "2025-01-31").unwrap();
        assert!(range.contains(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()));
        assert!(range.contains(NaiveDate::from_ymd_opt(2025, 1, 31).unwrap()));
        assert!(!range.contains(NaiveDate::from_ymd_opt(2025, 2, 1).unwrap()));
        assert!(DateRange::parse("2025-13-01", "2025-01-31").is_none());
    }

    #[test]
    fn test_parsed_date_tolerates_verbatim_answers() {
        let mut sale = sample();
        assert!(sale.parsed_date().is_some());
        sale.date = "15".to_string();
        assert!(sale.parsed_date().is_none());
    }
}
