//! Configuration for the Orchestrator

use serde::{Deserialize, Serialize};

/// Configuration for the Orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Maximum length of a suggested description (characters)
    pub description_max_chars: usize,

    /// Evidence text kept per field when building the prompt (characters)
    pub max_evidence_chars: usize,

    /// Run grounding searches when a search provider is available
    pub grounding_enabled: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            description_max_chars: 250,
            max_evidence_chars: 1_500,
            grounding_enabled: true,
        }
    }
}

impl OrchestratorConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.description_max_chars == 0 {
            return Err("description_max_chars must be greater than 0".to_string());
        }
        if self.max_evidence_chars == 0 {
            return Err("max_evidence_chars must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
