//! Per-field value suggestions

use serde::{Deserialize, Serialize};

/// A suggested value for one field.
///
/// Confidence encodes provenance trust: official vendor sources sit around
/// 0.85-0.95, third-party fallbacks around 0.5-0.7, unresolved fields around
/// 0.3-0.4.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    /// Id of the field this suggestion targets
    pub field_id: String,

    /// Label of the field
    #[serde(default)]
    pub field_name: String,

    /// Value the field had when the request was made
    #[serde(default)]
    pub current_value: String,

    /// Suggested value, `None` when nothing could be sourced
    #[serde(default)]
    pub recommendation: Option<String>,

    /// Confidence in [0, 1]
    #[serde(default)]
    pub confidence: f64,

    /// Short explanation, usually naming the source
    #[serde(default)]
    pub reasoning: String,
}

impl Recommendation {
    /// Clamp confidence into [0, 1], mapping NaN to 0
    pub fn normalize_confidence(&mut self) {
        self.confidence = if self.confidence.is_nan() {
            0.0
        } else {
            self.confidence.clamp(0.0, 1.0)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_recommendation_round_trips() {
        let json = r#"{
            "fieldId": "activeDateUrl",
            "fieldName": "Active Date URL",
            "currentValue": "",
            "recommendation": null,
            "confidence": 0.3,
            "reasoning": "No source URL available"
        }"#;
        let rec: Recommendation = serde_json::from_str(json).unwrap();
        assert!(rec.recommendation.is_none());
        assert_eq!(rec.confidence, 0.3);
    }

    #[test]
    fn test_normalize_confidence() {
        let mut rec: Recommendation =
            serde_json::from_str(r#"{"fieldId": "x", "confidence": 1.7}"#).unwrap();
        rec.normalize_confidence();
        assert_eq!(rec.confidence, 1.0);

        rec.confidence = -0.2;
        rec.normalize_confidence();
        assert_eq!(rec.confidence, 0.0);

        rec.confidence = f64::NAN;
        rec.normalize_confidence();
        assert_eq!(rec.confidence, 0.0);
    }
}
