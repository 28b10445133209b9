//! Configuration file parsing for the recommendation server.
//!
//! Loads bind settings, model gateway and search credentials, and
//! orchestrator tuning from TOML. Credentials can be supplied through the
//! environment instead of the file.

use fieldsage_orchestrator::OrchestratorConfig;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the model gateway key
pub const LLM_KEY_ENV: &str = "FIELDSAGE_LLM_API_KEY";

/// Environment variable holding the search API key
pub const SEARCH_KEY_ENV: &str = "FIELDSAGE_SEARCH_API_KEY";

/// Older variable names still honoured when the new ones are unset
const LEGACY_LLM_KEY_ENV: &str = "LOVABLE_API_KEY";
const LEGACY_SEARCH_KEY_ENV: &str = "PERPLEXITY_API_KEY";

/// Server configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// A value failed validation
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Server configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Bind port (e.g., 8787)
    #[serde(default = "default_bind_port")]
    pub bind_port: u16,

    /// Log filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Generative model gateway
    #[serde(default)]
    pub llm: LlmSection,

    /// Grounding search backend
    #[serde(default)]
    pub search: SearchSection,

    /// Orchestrator tuning
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
}

/// `[llm]` section
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSection {
    /// Chat-completions endpoint
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,

    /// Model identifier
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Bearer key; without one every recommendation request fails
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

/// `[search]` section
#[derive(Debug, Clone, Deserialize)]
pub struct SearchSection {
    /// Search endpoint
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,

    /// Search model identifier
    #[serde(default = "default_search_model")]
    pub model: String,

    /// Bearer key; without one recommendations are ungrounded
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,

    /// Turn grounding off even when a key is present
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_bind_port() -> u16 {
    8787
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_llm_endpoint() -> String {
    fieldsage_llm::gateway::DEFAULT_ENDPOINT.to_string()
}

fn default_llm_model() -> String {
    fieldsage_llm::gateway::DEFAULT_MODEL.to_string()
}

fn default_llm_timeout() -> u64 {
    fieldsage_llm::gateway::DEFAULT_TIMEOUT_SECS
}

fn default_search_endpoint() -> String {
    fieldsage_search::sonar::DEFAULT_ENDPOINT.to_string()
}

fn default_search_model() -> String {
    fieldsage_search::sonar::DEFAULT_MODEL.to_string()
}

fn default_search_timeout() -> u64 {
    fieldsage_search::sonar::DEFAULT_TIMEOUT_SECS
}

fn default_true() -> bool {
    true
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            model: default_llm_model(),
            api_key: None,
            timeout_secs: default_llm_timeout(),
        }
    }
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            endpoint: default_search_endpoint(),
            model: default_search_model(),
            api_key: None,
            timeout_secs: default_search_timeout(),
            enabled: true,
        }
    }
}

impl LlmSection {
    /// Configured key, ignoring blank values
    pub fn key(&self) -> Option<&str> {
        non_blank(self.api_key.as_deref())
    }

    /// Request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl SearchSection {
    /// Configured key, ignoring blank values
    pub fn key(&self) -> Option<&str> {
        non_blank(self.api_key.as_deref())
    }

    /// Request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl ServerConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: ServerConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Configuration for running locally with no credentials
    pub fn default_local() -> Self {
        ServerConfig {
            bind_address: default_bind_address(),
            bind_port: default_bind_port(),
            log_level: default_log_level(),
            llm: LlmSection::default(),
            search: SearchSection::default(),
            orchestrator: OrchestratorConfig::default(),
        }
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "llm.timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.search.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "search.timeout_secs must be greater than 0".to_string(),
            ));
        }
        self.orchestrator.validate().map_err(ConfigError::Invalid)
    }

    /// Fill credentials from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_with(|name| std::env::var(name).ok());
    }

    /// Fill credentials using `lookup` in place of the process environment
    ///
    /// The prefixed variables win over the legacy names, and either wins over
    /// the file.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |primary: &str, legacy: &str| {
            lookup(primary)
                .or_else(|| lookup(legacy))
                .filter(|v| !v.trim().is_empty())
        };

        if let Some(key) = pick(LLM_KEY_ENV, LEGACY_LLM_KEY_ENV) {
            self.llm.api_key = Some(key);
        }
        if let Some(key) = pick(SEARCH_KEY_ENV, LEGACY_SEARCH_KEY_ENV) {
            self.search.api_key = Some(key);
        }
    }

    /// Get the full bind address (address:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.bind_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_local() {
        let config = ServerConfig::default_local();
        assert_eq!(config.bind_addr(), "127.0.0.1:8787");
        assert_eq!(config.log_level, "info");
        assert!(config.llm.key().is_none());
        assert!(config.search.enabled);
        assert_eq!(config.search.model, "sonar");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            bind_address = "0.0.0.0"
            bind_port = 9000
            log_level = "debug"

            [llm]
            model = "google/gemini-2.5-pro"
            api_key = "llm-key"
            timeout_secs = 30

            [search]
            enabled = false

            [orchestrator]
            description_max_chars = 180
        "#;

        let config = ServerConfig::from_toml(toml).unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:9000");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.llm.model, "google/gemini-2.5-pro");
        assert_eq!(config.llm.key(), Some("llm-key"));
        assert_eq!(config.llm.timeout(), Duration::from_secs(30));
        assert_eq!(config.llm.endpoint, fieldsage_llm::gateway::DEFAULT_ENDPOINT);
        assert!(!config.search.enabled);
        assert_eq!(config.orchestrator.description_max_chars, 180);
        assert_eq!(config.orchestrator.max_evidence_chars, 1_500);
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = ServerConfig::from_toml("").unwrap();
        assert_eq!(config.bind_port, 8787);
        assert!(config.search.key().is_none());
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let err = ServerConfig::from_toml("[llm]\ntimeout_secs = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_invalid_orchestrator_section() {
        let err = ServerConfig::from_toml("[orchestrator]\nmax_evidence_chars = 0").unwrap_err();
        assert!(err.to_string().contains("max_evidence_chars"));
    }

    #[test]
    fn test_blank_key_is_unset() {
        let mut config = ServerConfig::default_local();
        config.llm.api_key = Some("   ".to_string());
        assert!(config.llm.key().is_none());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("FIELDSAGE_LLM_API_KEY", "new-llm"),
            ("LOVABLE_API_KEY", "old-llm"),
            ("PERPLEXITY_API_KEY", "old-search"),
        ]
        .into_iter()
        .collect();

        let mut config = ServerConfig::default_local();
        config.search.api_key = Some("from-file".to_string());
        config.apply_env_with(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.llm.key(), Some("new-llm"));
        assert_eq!(config.search.key(), Some("old-search"));
    }

    #[test]
    fn test_env_absent_keeps_file_values() {
        let mut config = ServerConfig::default_local();
        config.llm.api_key = Some("from-file".to_string());
        config.apply_env_with(|_| None);
        assert_eq!(config.llm.key(), Some("from-file"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bind_port = 9100").unwrap();
        writeln!(file, "[search]").unwrap();
        writeln!(file, "api_key = \"search-key\"").unwrap();

        let config = ServerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.bind_port, 9100);
        assert_eq!(config.search.key(), Some("search-key"));
    }

    #[test]
    fn test_missing_file() {
        let err = ServerConfig::from_file("/nonexistent/fieldsage.toml").unwrap_err();
        assert!(matches!(err, ConfigError::FileRead(_)));
    }
}
