//! Configuration for field discovery and writes

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the page layer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// Maximum number of fields returned by one extraction
    pub max_fields: usize,

    /// Field names or ids never reported (matched ignoring case and separators)
    pub deny_list: Vec<String>,

    /// Upper bound for each wait in the dropdown write sequence (milliseconds)
    pub wait_timeout_ms: u64,

    /// Delay between condition checks while waiting (milliseconds)
    pub poll_interval_ms: u64,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            max_fields: 20,
            deny_list: vec![
                "external id".to_string(),
                "product id".to_string(),
            ],
            wait_timeout_ms: 2_000,
            poll_interval_ms: 50,
        }
    }
}

impl PageConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_fields == 0 {
            return Err("max_fields must be greater than 0".to_string());
        }
        if self.poll_interval_ms == 0 {
            return Err("poll_interval_ms must be greater than 0".to_string());
        }
        if self.wait_timeout_ms < self.poll_interval_ms {
            return Err("wait_timeout_ms must be at least poll_interval_ms".to_string());
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

    /// Whether a field with this name or id is deny-listed.
    ///
    /// Entries match whole words: `External_ID`, `externalId` and
    /// `External ID` all match "external id", `productIdentifier` does not
    /// match "product id".
    pub fn is_denied(&self, field_name: &str, field_id: &str) -> bool {
        let name = words(field_name);
        let id = words(field_id);
        self.deny_list.iter().any(|entry| {
            let entry = words(entry);
            !entry.is_empty() && (contains_words(&name, &entry) || contains_words(&id, &entry))
        })
    }

    pub(crate) fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    pub(crate) fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Lowercase words, split at separators and lower-to-upper case changes
fn words(s: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for c in s.chars() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase() || c.is_numeric();
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// `entry` appears as a run of whole words, or squashed into one word
fn contains_words(haystack: &[String], entry: &[String]) -> bool {
    let joined = entry.concat();
    haystack.windows(entry.len()).any(|w| w == entry) || haystack.iter().any(|w| *w == joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PageConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_fields, 20);
    }

    #[test]
    fn test_invalid_wait_bounds() {
        let config = PageConfig {
            wait_timeout_ms: 10,
            poll_interval_ms: 50,
            ..PageConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deny_list_variants() {
        let config = PageConfig::default();
        assert!(config.is_denied("External ID", "x"));
        assert!(config.is_denied("Anything", "external_id"));
        assert!(config.is_denied("Anything", "fs-externalId"));
        assert!(config.is_denied("Product-ID", "p"));
        assert!(!config.is_denied("Name", "name"));
        assert!(!config.is_denied("Product", "product"));
    }

    #[test]
    fn test_deny_list_matches_whole_words_only() {
        let config = PageConfig::default();
        assert!(config.is_denied("EXTERNALID", "x"));
        assert!(config.is_denied("Legacy Product ID (old)", "p"));
        assert!(!config.is_denied("Product Identifier", "productIdentifier"));
        assert!(!config.is_denied("Anything", "productidentifier"));
        assert!(!config.is_denied("Reproduct ID", "x"));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = PageConfig::from_toml("max_fields = 5\ndeny_list = [\"owner\"]").unwrap();
        assert_eq!(config.max_fields, 5);
        assert_eq!(config.deny_list, vec!["owner".to_string()]);
        assert_eq!(config.wait_timeout_ms, 2_000);
    }
}
