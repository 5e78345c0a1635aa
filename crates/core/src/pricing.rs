//! Buffet pricing table
//!
//! Maps a buffet tier name (or one of its aliases) to the price per person.
//! Lookups are case-insensitive and ignore surrounding whitespace; an unknown
//! tier yields `None` rather than an error.

use serde::{Deserialize, Serialize};

/// One buffet tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuffetTier {
    /// Canonical tier name (e.g., "premium")
    pub name: String,
    /// Price per person in baht
    pub price_per_person: u32,
    /// Alternative spellings, e.g. the Thai name
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl BuffetTier {
    pub fn new(name: impl Into<String>, price_per_person: u32) -> Self {
        Self {
            name: name.into(),
            price_per_person,
            aliases: Vec::new(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    fn matches(&self, key: &str) -> bool {
        self.name.trim().to_lowercase() == key
            || self.aliases.iter().any(|a| a.trim().to_lowercase() == key)
    }
}

/// Tier name → price lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTable {
    pub tiers: Vec<BuffetTier>,
}

impl Default for PricingTable {
    fn default() -> Self {
        Self {
            tiers: vec![
                BuffetTier::new("standard", 299)
                    .with_alias("สแตนดาร์ด")
                    .with_alias("มาตรฐาน"),
                BuffetTier::new("premium", 399).with_alias("พรีเมียม"),
                BuffetTier::new("vip", 599).with_alias("วีไอพี"),
            ],
        }
    }
}

impl PricingTable {
    pub fn new(tiers: Vec<BuffetTier>) -> Self {
        Self { tiers }
    }

    /// Price per person for a tier name or alias
    pub fn price_for(&self, buffet_type: &str) -> Option<u32> {
        self.tier(buffet_type).map(|t| t.price_per_person)
    }

    pub fn tier(&self, buffet_type: &str) -> Option<&BuffetTier> {
        let key = buffet_type.trim().to_lowercase();
        if key.is_empty() {
            return None;
        }
        self.tiers.iter().find(|t| t.matches(&key))
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// Human-readable price list for the classifier prompt
    pub fn describe(&self) -> String {
        self.tiers
            .iter()
            .map(|t| {
                if t.aliases.is_empty() {
                    format!("- {}: {} บาท/ท่าน", t.name, t.price_per_person)
                } else {
                    format!(
                        "- {} ({}): {} บาท/ท่าน",
                        t.name,
                        t.aliases.join(", "),
                        t.price_per_person
                    )
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
