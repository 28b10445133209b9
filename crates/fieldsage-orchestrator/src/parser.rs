//! Parse model output into recommendations

use crate::error::OrchestratorError;
use fieldsage_domain::Recommendation;
use serde_json::Value;
use tracing::warn;

/// Parse the model reply into recommendations
///
/// Prose or code fences around the array are ignored: everything from the
/// first `[` to the last `]` is taken as the payload. Items that fail to
/// deserialize are skipped with a warning.
pub fn parse_recommendations(response: &str) -> Result<Vec<Recommendation>, OrchestratorError> {
    let malformed = || OrchestratorError::MalformedOutput {
        raw: response.to_string(),
    };

    let json_str = extract_json_array(response).ok_or_else(malformed)?;
    let parsed: Value = serde_json::from_str(json_str).map_err(|_| malformed())?;
    let items = parsed.as_array().ok_or_else(malformed)?;

    let mut recommendations = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        match parse_item(item) {
            Ok(rec) => recommendations.push(rec),
            Err(e) => warn!("Skipping recommendation {}: {}", idx, e),
        }
    }

    Ok(recommendations)
}

/// Slice from the first `[` to the last `]`
fn extract_json_array(response: &str) -> Option<&str> {
    let start = response.find('[')?;
    let end = response.rfind(']')?;
    if end < start {
        return None;
    }
    Some(&response[start..=end])
}

fn parse_item(item: &Value) -> Result<Recommendation, String> {
    let obj = item
        .as_object()
        .ok_or_else(|| "Recommendation is not a JSON object".to_string())?;

    match obj.get("fieldId") {
        Some(Value::String(id)) if !id.trim().is_empty() => {}
        _ => return Err("Missing or invalid 'fieldId'".to_string()),
    }

    let mut obj = obj.clone();
    for key in ["fieldName", "currentValue", "reasoning"] {
        if obj.get(key).is_some_and(Value::is_null) {
            obj.remove(key);
        }
    }
    // Models sometimes quote the score
    if let Some(Value::String(s)) = obj.get("confidence") {
        let score = s.trim().parse::<f64>().map_err(|e| format!("Invalid 'confidence': {}", e))?;
        obj.insert("confidence".to_string(), Value::from(score));
    }
    // Non-string recommendations (numbers, booleans) are stringified
    if let Some(value) = obj.get("recommendation") {
        if !value.is_string() && !value.is_null() {
            let text = value.to_string();
            obj.insert("recommendation".to_string(), Value::String(text));
        }
    }

    let mut rec: Recommendation =
        serde_json::from_value(Value::Object(obj)).map_err(|e| e.to_string())?;
    rec.normalize_confidence();
    Ok(rec)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_array() {
        let response = r#"[
            {"fieldId": "desc", "fieldName": "Description", "currentValue": "",
             "recommendation": "A document database.", "confidence": 0.8, "reasoning": "From vendor site"}
        ]"#;
        let recs = parse_recommendations(response).unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].field_id, "desc");
        assert_eq!(recs[0].recommendation.as_deref(), Some("A document database."));
        assert!((recs[0].confidence - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_with_surrounding_text() {
        let response = "Here you go:\n```json\n[{\"fieldId\": \"a\", \"recommendation\": null, \"confidence\": 0.3}]\n```\nDone.";
        let recs = parse_recommendations(response).unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].recommendation, None);
    }

    #[test]
    fn test_skips_invalid_items() {
        let response = r#"[
            {"fieldId": "a", "recommendation": "x", "confidence": 0.5},
            {"recommendation": "no id"},
            "not an object",
            {"fieldId": "b", "recommendation": 2022, "confidence": "0.7"}
        ]"#;
        let recs = parse_recommendations(response).unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[1].field_id, "b");
        assert_eq!(recs[1].recommendation.as_deref(), Some("2022"));
        assert!((recs[1].confidence - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clamps_confidence() {
        let recs =
            parse_recommendations(r#"[{"fieldId": "a", "confidence": 1.7}]"#).unwrap();
        assert_eq!(recs[0].confidence, 1.0);
    }

    #[test]
    fn test_no_array_is_malformed() {
        let err = parse_recommendations("I could not find anything.").unwrap_err();
        assert_eq!(
            err,
            OrchestratorError::MalformedOutput {
                raw: "I could not find anything.".to_string()
            }
        );
    }

    #[test]
    fn test_broken_json_is_malformed() {
        let err = parse_recommendations("[{\"fieldId\": ]").unwrap_err();
        assert!(matches!(err, OrchestratorError::MalformedOutput { .. }));
    }
}
