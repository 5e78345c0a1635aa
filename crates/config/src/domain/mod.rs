//! Restaurant domain configuration
//!
//! Everything restaurant-specific that is not a deployment setting: the
//! buffet pricing table, the classifier system prompt and the localized
//! reply templates. Loaded from a single YAML file; every section falls back
//! to the built-in Thai defaults.
//!
//! ```yaml
//! pricing:
//!   tiers:
//!     - name: standard
//!       price_per_person: 299
//!       aliases: ["สแตนดาร์ด"]
//! responses:
//!   cancelled: "ยกเลิกแล้วค่ะ"
//! ```

mod prompts;

pub use prompts::{fill_template, ResponseTemplates, SystemPromptConfig};

use buffet_pos_core::PricingTable;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::ConfigError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomainConfig {
    #[serde(default)]
    pub pricing: PricingTable,

    #[serde(default)]
    pub system_prompt: SystemPromptConfig,

    #[serde(default)]
    pub responses: ResponseTemplates,
}

impl DomainConfig {
    /// Load from a YAML file and validate
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileNotFound(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_yaml(&content)?;
        tracing::info!(
            path = %path.display(),
            tiers = config.pricing.tiers.len(),
            "Loaded domain config"
        );
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pricing.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "pricing.tiers".to_string(),
                message: "At least one buffet tier is required".to_string(),
            });
        }

        for tier in &self.pricing.tiers {
            if tier.name.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "pricing.tiers.name".to_string(),
                    message: "Tier name cannot be empty".to_string(),
                });
            }
            if tier.price_per_person == 0 {
                return Err(ConfigError::InvalidValue {
                    field: format!("pricing.tiers.{}.price_per_person", tier.name),
                    message: "Price must be positive".to_string(),
                });
            }
        }

        if self.responses.affirmative_tokens.iter().all(|t| t.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "responses.affirmative_tokens".to_string(),
                message: "At least one affirmative token is required".to_string(),
            });
        }

        if !self.system_prompt.template.contains("{price_list}") {
            tracing::warn!("System prompt template has no {{price_list}} placeholder");
        }

        Ok(())
    }
}
