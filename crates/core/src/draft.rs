//! Slot-filling draft for a new sale
//!
//! A draft collects the six required fields across several turns. It is
//! eligible for confirmation only when every field is present, at which point
//! it converts into a [`NewSale`] with the derived total.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::lenient;
use crate::pricing::PricingTable;
use crate::sale::NewSale;

/// Required fields of a sale, in prompting order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SaleField {
    Date,
    TableNumber,
    CustomerCount,
    BuffetType,
    PricePerPerson,
    PaymentMethod,
}

impl SaleField {
    pub const REQUIRED: [SaleField; 6] = [
        SaleField::Date,
        SaleField::TableNumber,
        SaleField::CustomerCount,
        SaleField::BuffetType,
        SaleField::PricePerPerson,
        SaleField::PaymentMethod,
    ];

    /// Wire name of the field
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleField::Date => "date",
            SaleField::TableNumber => "tableNumber",
            SaleField::CustomerCount => "customerCount",
            SaleField::BuffetType => "buffetType",
            SaleField::PricePerPerson => "pricePerPerson",
            SaleField::PaymentMethod => "paymentMethod",
        }
    }

    /// Thai label used in prompts
    pub fn label(&self) -> &'static str {
        match self {
            SaleField::Date => "วันที่",
            SaleField::TableNumber => "หมายเลขโต๊ะ",
            SaleField::CustomerCount => "จำนวนลูกค้า",
            SaleField::BuffetType => "ประเภทบุฟเฟต์",
            SaleField::PricePerPerson => "ราคาต่อคน",
            SaleField::PaymentMethod => "วิธีการชำระเงิน",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            SaleField::TableNumber | SaleField::CustomerCount | SaleField::PricePerPerson
        )
    }
}

impl std::fmt::Display for SaleField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A numeric field received a non-numeric (or non-positive) answer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid value for {field}: \"{value}\"")]
pub struct InvalidFieldValue {
    pub field: SaleField,
    pub value: String,
}

/// Partially filled sale
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SaleDraft {
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
}

impl SaleDraft {
    pub fn has(&self, field: SaleField) -> bool {
        match field {
            SaleField::Date => non_empty(&self.date),
            SaleField::TableNumber => self.table_number.is_some_and(|v| v > 0),
            SaleField::CustomerCount => self.customer_count.is_some_and(|v| v > 0),
            SaleField::BuffetType => non_empty(&self.buffet_type),
            SaleField::PricePerPerson => self.price_per_person.is_some_and(|v| v > 0),
            SaleField::PaymentMethod => non_empty(&self.payment_method),
        }
    }

    /// Required fields still absent, in prompting order
    pub fn missing_fields(&self) -> Vec<SaleField> {
        SaleField::REQUIRED
            .into_iter()
            .filter(|f| !self.has(*f))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Fill `price_per_person` from the buffet tier when it is still absent.
    ///
    /// Returns true if a price was derived. An existing price is never
    /// overwritten, and an unknown tier leaves the price missing.
    pub fn derive_price(&mut self, pricing: &PricingTable) -> bool {
        if self.has(SaleField::PricePerPerson) {
            return false;
        }
        let Some(price) = self.buffet_type.as_deref().and_then(|b| pricing.price_for(b)) else {
            return false;
        };
        self.price_per_person = Some(price);
        true
    }

    /// Store a raw user answer into `field`.
    ///
    /// Numeric fields take the leading integer of the answer ("4 คน" → 4);
    /// anything else is stored verbatim after trimming.
    pub fn set_field(&mut self, field: SaleField, raw: &str) -> Result<(), InvalidFieldValue> {
        let value = raw.trim();
        if field.is_numeric() {
            let n = parse_leading_int(value)
                .filter(|n| *n > 0)
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| InvalidFieldValue {
                    field,
                    value: value.to_string(),
                })?;
            match field {
                SaleField::TableNumber => self.table_number = Some(n),
                SaleField::CustomerCount => self.customer_count = Some(n),
                _ => self.price_per_person = Some(n),
            }
            return Ok(());
        }

        if value.is_empty() {
            return Err(InvalidFieldValue {
                field,
                value: value.to_string(),
            });
        }
        let value = Some(value.to_string());
        match field {
            SaleField::Date => self.date = value,
            SaleField::BuffetType => self.buffet_type = value,
            _ => self.payment_method = value,
        }
        Ok(())
    }

    /// `customer_count × price_per_person`, if both are known
    pub fn total_amount(&self) -> Option<u64> {
        Some(u64::from(self.customer_count?) * u64::from(self.price_per_person?))
    }

    /// Convert a complete draft into a creation payload with the derived total
    pub fn to_new_sale(&self) -> Option<NewSale> {
        if !self.is_complete() {
            return None;
        }
        Some(NewSale {
            date: self.date.clone()?,
            table_number: self.table_number?,
            customer_count: self.customer_count?,
            buffet_type: self.buffet_type.clone()?,
            price_per_person: self.price_per_person?,
            payment_method: self.payment_method.clone()?,
            total_amount: self.total_amount()?,
        })
    }
}

fn non_empty(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

/// Leading integer of a string, e.g. "12abc" → 12, "-3" → -3, "abc" → None
fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}
