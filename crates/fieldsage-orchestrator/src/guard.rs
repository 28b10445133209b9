//! Post-generation enforcement
//!
//! The model is told the rules; this module makes sure they hold anyway.

use crate::evidence::EvidenceSet;
use crate::field_kind::FieldKind;
use fieldsage_domain::{EntityAnchor, FieldDescriptor, LifecycleSlot, Recommendation, UrlCache};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Confidence given to a URL field with no cached source
pub const UNRESOLVED_CONFIDENCE: f64 = 0.3;

/// Applies field-identity and URL-pairing rules to model output
pub struct OutputGuard<'a> {
    anchor: Option<&'a EntityAnchor>,
    cache: &'a UrlCache,
    evidence: &'a EvidenceSet,
}

impl<'a> OutputGuard<'a> {
    /// Create a guard over the post-search cache and evidence
    pub fn new(
        anchor: Option<&'a EntityAnchor>,
        cache: &'a UrlCache,
        evidence: &'a EvidenceSet,
    ) -> Self {
        Self {
            anchor,
            cache,
            evidence,
        }
    }

    /// Reconcile parsed recommendations with the requested fields.
    ///
    /// Output follows request order. Unknown and duplicate ids are dropped;
    /// URL fields the model skipped are filled in.
    pub fn apply(
        &self,
        fields: &[(FieldDescriptor, FieldKind)],
        parsed: Vec<Recommendation>,
    ) -> Vec<Recommendation> {
        let mut by_id: HashMap<String, Recommendation> = HashMap::new();
        for rec in parsed {
            if !fields.iter().any(|(f, _)| f.field_id == rec.field_id) {
                warn!("Dropping recommendation for unknown field '{}'", rec.field_id);
                continue;
            }
            if by_id.contains_key(&rec.field_id) {
                warn!("Dropping duplicate recommendation for '{}'", rec.field_id);
                continue;
            }
            by_id.insert(rec.field_id.clone(), rec);
        }

        let mut out = Vec::with_capacity(fields.len());
        for (field, kind) in fields {
            let rec = match (by_id.remove(&field.field_id), kind) {
                (Some(rec), _) => rec,
                (None, FieldKind::LifecycleUrl(_)) => Recommendation {
                    field_id: field.field_id.clone(),
                    ..Default::default()
                },
                (None, _) => {
                    debug!("Model returned nothing for '{}'", field.field_id);
                    continue;
                }
            };
            out.push(self.enforce(field, *kind, rec));
        }
        out
    }

    fn enforce(
        &self,
        field: &FieldDescriptor,
        kind: FieldKind,
        mut rec: Recommendation,
    ) -> Recommendation {
        if rec.field_name.trim().is_empty() {
            rec.field_name = field.field_name.clone();
        }
        if rec.current_value.trim().is_empty() {
            rec.current_value = field.current_value.clone();
        }
        rec.normalize_confidence();

        match kind {
            FieldKind::Name => {
                if let Some(anchor) = self.anchor {
                    if rec.recommendation.as_deref() != Some(anchor.as_str()) {
                        warn!(
                            "Name recommendation {:?} differs from confirmed component; using anchor",
                            rec.recommendation
                        );
                        rec.recommendation = Some(anchor.to_string());
                        rec.reasoning = format!("Confirmed component name: {}", anchor);
                    }
                }
            }
            FieldKind::LifecycleUrl(slot) => self.pair_url(slot, &mut rec),
            _ => {}
        }
        rec
    }

    fn pair_url(&self, slot: LifecycleSlot, rec: &mut Recommendation) {
        let cached = self.cache.urls(slot);
        let proposed = rec
            .recommendation
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty());

        match (cached.first(), proposed) {
            (Some(_), Some(value)) if cached.iter().any(|u| u == value) => {
                rec.recommendation = Some(value.to_string());
            }
            (Some(primary), _) => {
                if proposed.is_some() {
                    warn!(
                        "URL for {} does not match the cached source; replacing",
                        slot.key()
                    );
                }
                rec.recommendation = Some(primary.clone());
                rec.confidence = self
                    .evidence
                    .provenance_of(slot)
                    .map(|p| p.default_confidence())
                    .unwrap_or(0.6);
                rec.reasoning = format!("Source used for the {}: {}", slot.label(), primary);
            }
            (None, _) => {
                if proposed.is_some() {
                    warn!(
                        "URL for {} proposed with no cached source; clearing",
                        slot.key()
                    );
                }
                rec.recommendation = None;
                rec.confidence = UNRESOLVED_CONFIDENCE;
                rec.reasoning = format!("No source URL found for the {}", slot.label());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::Provenance;

    fn classified(fields: Vec<FieldDescriptor>) -> Vec<(FieldDescriptor, FieldKind)> {
        fields
            .into_iter()
            .map(|f| {
                let kind = FieldKind::of(&f);
                (f, kind)
            })
            .collect()
    }

    fn rec(id: &str, value: Option<&str>, confidence: f64) -> Recommendation {
        Recommendation {
            field_id: id.to_string(),
            recommendation: value.map(str::to_string),
            confidence,
            ..Default::default()
        }
    }

    #[test]
    fn test_orders_filters_and_fills() {
        let fields = classified(vec![
            FieldDescriptor::new("a", "Description", "old"),
            FieldDescriptor::new("b", "Category", ""),
        ]);
        let cache = UrlCache::new();
        let evidence = EvidenceSet::default();
        let guard = OutputGuard::new(None, &cache, &evidence);

        let out = guard.apply(
            &fields,
            vec![
                rec("b", Some("Database"), 0.7),
                rec("zzz", Some("?"), 0.9),
                rec("a", Some("new"), 1.4),
                rec("a", Some("dup"), 0.5),
            ],
        );

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].field_id, "a");
        assert_eq!(out[0].field_name, "Description");
        assert_eq!(out[0].current_value, "old");
        assert_eq!(out[0].recommendation.as_deref(), Some("new"));
        assert_eq!(out[0].confidence, 1.0);
        assert_eq!(out[1].field_id, "b");
    }

    #[test]
    fn test_url_replaced_with_cached_source() {
        let fields = classified(vec![FieldDescriptor::new("eosUrl", "End of Support URL", "")]);
        let mut cache = UrlCache::new();
        cache.record(
            LifecycleSlot::EndOfSupportDate,
            vec!["https://www.mongodb.com/legal/support-policy/lifecycles".to_string()],
        );
        let evidence = EvidenceSet {
            items: vec![],
            slot_provenance: vec![(LifecycleSlot::EndOfSupportDate, Provenance::Official)],
        };
        let guard = OutputGuard::new(None, &cache, &evidence);

        let out = guard.apply(
            &fields,
            vec![rec("eosUrl", Some("https://endoflife.date/mongodb"), 0.8)],
        );

        assert_eq!(
            out[0].recommendation.as_deref(),
            Some("https://www.mongodb.com/legal/support-policy/lifecycles")
        );
        assert_eq!(out[0].confidence, 0.9);
    }

    #[test]
    fn test_matching_url_keeps_model_confidence() {
        let fields = classified(vec![FieldDescriptor::new("activeUrl", "Active Date URL", "")]);
        let mut cache = UrlCache::new();
        cache.record(
            LifecycleSlot::ActiveDate,
            vec!["https://kafka.apache.org/downloads".to_string()],
        );
        let evidence = EvidenceSet::default();
        let guard = OutputGuard::new(None, &cache, &evidence);

        let out = guard.apply(
            &fields,
            vec![rec("activeUrl", Some(" https://kafka.apache.org/downloads "), 0.88)],
        );

        assert_eq!(
            out[0].recommendation.as_deref(),
            Some("https://kafka.apache.org/downloads")
        );
        assert_eq!(out[0].confidence, 0.88);
    }

    #[test]
    fn test_url_without_cache_is_null() {
        let fields = classified(vec![
            FieldDescriptor::new("eosaleUrl", "End of Sale URL", ""),
            FieldDescriptor::new("eosUrl", "End of Support URL", ""),
        ]);
        let cache = UrlCache::new();
        let evidence = EvidenceSet::default();
        let guard = OutputGuard::new(None, &cache, &evidence);

        // Model invents one URL and skips the other
        let out = guard.apply(&fields, vec![rec("eosaleUrl", Some("https://made.up/x"), 0.9)]);

        assert_eq!(out.len(), 2);
        for r in &out {
            assert_eq!(r.recommendation, None);
            assert_eq!(r.confidence, UNRESOLVED_CONFIDENCE);
        }
        assert_eq!(out[1].field_name, "End of Support URL");
    }

    #[test]
    fn test_name_pinned_to_anchor() {
        let fields = classified(vec![FieldDescriptor::new("name", "Name", "")]);
        let anchor = EntityAnchor::confirm("MongoDB Community Server 8.2").unwrap();
        let cache = UrlCache::new();
        let evidence = EvidenceSet::default();
        let guard = OutputGuard::new(Some(&anchor), &cache, &evidence);

        let out = guard.apply(
            &fields,
            vec![rec("name", Some("MongoDB Enterprise Server 8.2"), 0.9)],
        );

        assert_eq!(
            out[0].recommendation.as_deref(),
            Some("MongoDB Community Server 8.2")
        );
    }
}
