//! Entity anchor: the confirmed component name for a session
//!
//! Every per-field search and recommendation is pinned to one anchor so the
//! model cannot drift to a different product identity.

use std::fmt;
use thiserror::Error;

/// Why a candidate name was refused as an anchor
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnchorError {
    /// Nothing but whitespace
    #[error("component name is empty")]
    Empty,

    /// Fewer than the two tokens needed for `[Provider][Product][Version]`
    #[error("component name '{0}' needs at least a product and a version")]
    TooShort(String),

    /// First token does not start with an uppercase letter
    #[error("component name '{0}' must start with a capitalized provider or product word")]
    NotCapitalized(String),

    /// Last token carries no digit
    #[error("component name '{0}' must end with a version token")]
    MissingVersion(String),
}

/// A component name validated against the `[Provider][Product][Version]` shape
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityAnchor(String);

impl EntityAnchor {
    /// Validate and confirm a component name.
    ///
    /// Accepts names that start with a capitalized word and end with a token
    /// containing a digit, e.g. "MongoDB Community Server 8.2" or
    /// "Oracle Database Enterprise Edition 19c".
    pub fn confirm(raw: &str) -> Result<Self, AnchorError> {
        let name = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        if name.is_empty() {
            return Err(AnchorError::Empty);
        }

        let tokens: Vec<&str> = name.split(' ').collect();
        if tokens.len() < 2 {
            return Err(AnchorError::TooShort(name));
        }

        let starts_upper = tokens[0]
            .chars()
            .next()
            .map(|c| c.is_uppercase())
            .unwrap_or(false);
        if !starts_upper {
            return Err(AnchorError::NotCapitalized(name));
        }

        let last = tokens[tokens.len() - 1];
        if !last.chars().any(|c| c.is_ascii_digit()) {
            return Err(AnchorError::MissingVersion(name));
        }

        Ok(Self(name))
    }

    /// The anchored name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EntityAnchor {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_conventional_names() {
        for name in [
            "MongoDB Community Server 8.2",
            "Oracle Database Enterprise Edition 19c",
            "Microsoft SQL Server 2022",
            "Apache Kafka 3.5",
        ] {
            assert!(EntityAnchor::confirm(name).is_ok(), "{name} should be accepted");
        }
    }

    #[test]
    fn test_normalizes_whitespace() {
        let anchor = EntityAnchor::confirm("  Apache   Kafka 3.5 ").unwrap();
        assert_eq!(anchor.as_str(), "Apache Kafka 3.5");
    }

    #[test]
    fn test_rejects_malformed_names() {
        assert_eq!(EntityAnchor::confirm("   "), Err(AnchorError::Empty));
        assert!(matches!(
            EntityAnchor::confirm("Kafka3"),
            Err(AnchorError::TooShort(_))
        ));
        assert!(matches!(
            EntityAnchor::confirm("mongodb server 8"),
            Err(AnchorError::NotCapitalized(_))
        ));
        assert!(matches!(
            EntityAnchor::confirm("MongoDB Community Server"),
            Err(AnchorError::MissingVersion(_))
        ));
    }
}
