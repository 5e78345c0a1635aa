//! Configuration management for the buffet POS assistant
//!
//! Supports loading configuration from:
//! - YAML files (`config/default.yaml`, `config/<env>.yaml`)
//! - Environment variables (`BUFFET_POS__` prefix, `__` separator)
//!
//! # Domain Configuration
//!
//! Restaurant-specific data lives in an optional domain YAML file
//! (`domain_config_path`): buffet tiers, the classifier system prompt and
//! the Thai reply templates. Built-in defaults are used when it is absent.

pub mod domain;
pub mod settings;

pub use domain::{fill_template, DomainConfig, ResponseTemplates, SystemPromptConfig};
pub use settings::{
    load_settings, DialogueConfig, LlmConfig, ObservabilityConfig, RuntimeEnvironment,
    ServerConfig, Settings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
