//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{ConfigError, DomainConfig};

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Development mode - relaxed validation, warnings only
    #[default]
    Development,
    /// Staging mode - stricter validation
    Staging,
    /// Production mode - all validations enforced
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Intent classifier oracle
    #[serde(default)]
    pub llm: LlmConfig,

    /// Dialogue session handling
    #[serde(default)]
    pub dialogue: DialogueConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Optional path to the restaurant domain YAML (pricing, prompts, replies)
    #[serde(default)]
    pub domain_config_path: Option<String>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_llm()?;
        self.validate_dialogue()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        if self.environment.is_production()
            && self.server.cors_enabled
            && self.server.cors_origins.iter().any(|o| o == "*")
        {
            return Err(ConfigError::InvalidValue {
                field: "server.cors_origins".to_string(),
                message: "Wildcard CORS origin is not allowed in production".to_string(),
            });
        }

        Ok(())
    }

    fn validate_llm(&self) -> Result<(), ConfigError> {
        let llm = &self.llm;

        if !matches!(llm.provider.to_lowercase().as_str(), "gemini" | "ollama") {
            return Err(ConfigError::InvalidValue {
                field: "llm.provider".to_string(),
                message: format!("Unknown provider '{}' (expected gemini or ollama)", llm.provider),
            });
        }

        if llm.model.trim().is_empty() {
            return Err(ConfigError::MissingField("llm.model".to_string()));
        }

        if let Some(t) = llm.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(ConfigError::InvalidValue {
                    field: "llm.temperature".to_string(),
                    message: format!("Must be between 0.0 and 2.0, got {}", t),
                });
            }
        }

        if llm.timeout_seconds == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "llm.timeout_seconds".to_string(),
                message: "Timeout must be positive when set".to_string(),
            });
        }

        let missing_key = llm.api_key.as_deref().map_or(true, |k| k.trim().is_empty());
        if llm.provider.eq_ignore_ascii_case("gemini") && missing_key {
            if self.environment.is_production() {
                return Err(ConfigError::MissingField("llm.api_key".to_string()));
            }
            tracing::warn!("No Gemini API key configured; chatbot requests will fail");
        }

        Ok(())
    }

    fn validate_dialogue(&self) -> Result<(), ConfigError> {
        if self.dialogue.default_conversation_id.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "dialogue.default_conversation_id".to_string(),
                message: "Default conversation id cannot be empty".to_string(),
            });
        }

        if self.dialogue.session_idle_timeout_seconds == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "dialogue.session_idle_timeout_seconds".to_string(),
                message: "Idle timeout must be positive when set".to_string(),
            });
        }

        if self.dialogue.sweep_interval_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "dialogue.sweep_interval_seconds".to_string(),
                message: "Sweep interval cannot be 0".to_string(),
            });
        }

        Ok(())
    }

    /// Load the domain config named by `domain_config_path`, or the built-in defaults
    pub fn load_domain(&self) -> Result<DomainConfig, ConfigError> {
        match &self.domain_config_path {
            Some(path) if !path.trim().is_empty() => DomainConfig::load(path),
            _ => Ok(DomainConfig::default()),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// CORS allowed origins; empty means localhost only
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3001
}
fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_enabled: true,
            cors_origins: Vec::new(),
        }
    }
}

/// Oracle (LLM) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider: "gemini" or "ollama"
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// API base URL; provider default when absent
    #[serde(default)]
    pub endpoint: Option<String>,

    /// API key (defaults to `GEMINI_API_KEY`)
    #[serde(default = "default_api_key", skip_serializing)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub temperature: Option<f32>,

    #[serde(default)]
    pub max_output_tokens: Option<u32>,

    /// Request timeout; no timeout when absent
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

fn default_provider() -> String {
    "gemini".to_string()
}
fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}
fn default_api_key() -> Option<String> {
    std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty())
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            endpoint: None,
            api_key: default_api_key(),
            temperature: None,
            max_output_tokens: None,
            timeout_seconds: None,
        }
    }
}

/// Dialogue session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueConfig {
    /// Conversation key used when a request names none
    #[serde(default = "default_conversation_id")]
    pub default_conversation_id: String,

    /// Drop sessions idle longer than this; sessions never expire when absent
    #[serde(default)]
    pub session_idle_timeout_seconds: Option<u64>,

    /// How often the idle sweeper runs
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
}

fn default_conversation_id() -> String {
    "default".to_string()
}
fn default_sweep_interval() -> u64 {
    60
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            default_conversation_id: default_conversation_id(),
            session_idle_timeout_seconds: None,
            sweep_interval_seconds: default_sweep_interval(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,

    /// Enable the Prometheus recorder and `/metrics`
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
        }
    }
}

/// Load settings from `config/` relative to the working directory
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    load_settings_from(Path::new("config"), env)
}

/// Load settings from files and environment
///
/// Layering (later wins): `<dir>/default.*`, `<dir>/<env>.*`, then
/// `BUFFET_POS__SECTION__KEY` environment variables.
pub fn load_settings_from(dir: &Path, env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    // Load default config
    builder = builder.add_source(File::from(dir.join("default")).required(false));

    // Load environment-specific config
    if let Some(env_name) = env {
        builder = builder.add_source(File::from(dir.join(env_name)).required(false));
    }

    // Load from environment variables
    builder = builder.add_source(
        Environment::with_prefix("BUFFET_POS")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 3001);
        assert_eq!(settings.llm.provider, "gemini");
        assert_eq!(settings.llm.model, "gemini-2.0-flash");
        assert_eq!(settings.llm.timeout_seconds, None);
        assert_eq!(settings.dialogue.default_conversation_id, "default");
        assert!(settings.dialogue.session_idle_timeout_seconds.is_none());
    }

    #[test]
    fn test_settings_validation() {
        let mut settings = Settings::default();
        settings.server.port = 0;
        assert!(settings.validate().is_err());

        settings.server.port = 3001;
        assert!(settings.validate().is_ok());

        settings.llm.temperature = Some(3.5);
        assert!(settings.validate().is_err());
        settings.llm.temperature = Some(0.2);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let mut settings = Settings::default();
        settings.llm.provider = "openai".to_string();
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "llm.provider"
        ));
    }

    #[test]
    fn test_empty_default_conversation_rejected() {
        let mut settings = Settings::default();
        settings.dialogue.default_conversation_id = "  ".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_production_requires_api_key() {
        let mut settings = Settings::default();
        settings.environment = RuntimeEnvironment::Production;
        settings.llm.api_key = None;
        assert!(matches!(settings.validate(), Err(ConfigError::MissingField(_))));

        settings.llm.api_key = Some("test-key".to_string());
        assert!(settings.validate().is_ok());

        settings.llm.provider = "ollama".to_string();
        settings.llm.api_key = None;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_production_rejects_wildcard_cors() {
        let mut settings = Settings::default();
        settings.environment = RuntimeEnvironment::Production;
        settings.llm.api_key = Some("k".to_string());
        settings.server.cors_origins = vec!["*".to_string()];
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_load_from_yaml_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("default.yaml"),
            "server:\n  port: 8088\nllm:\n  provider: ollama\n  model: qwen2.5:7b\ndialogue:\n  session_idle_timeout_seconds: 900\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("staging.yaml"), "server:\n  port: 9099\n").unwrap();

        let settings = load_settings_from(dir.path(), None).unwrap();
        assert_eq!(settings.server.port, 8088);
        assert_eq!(settings.llm.provider, "ollama");
        assert_eq!(settings.dialogue.session_idle_timeout_seconds, Some(900));

        let staged = load_settings_from(dir.path(), Some("staging")).unwrap();
        assert_eq!(staged.server.port, 9099);
        assert_eq!(staged.llm.model, "qwen2.5:7b");
    }

    #[test]
    fn test_load_domain_defaults_without_path() {
        let settings = Settings::default();
        let domain = settings.load_domain().unwrap();
        assert_eq!(domain.pricing.price_for("vip"), Some(599));
    }
}
