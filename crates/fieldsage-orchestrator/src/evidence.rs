//! Two-phase evidence gathering
//!
//! Phase 1 asks the search backend to answer from the vendor's own domain
//! only, then checks that the returned citations really are on that domain.
//! Phase 2 searches without restriction and tags the result non-official
//! unless one of its citations lands on the vendor domain.

use crate::field_kind::FieldKind;
use crate::query::{build_query, fallback_instructions, official_instructions, NOT_FOUND_SENTINEL};
use crate::vendor::{resolve_vendor_domain, verified_citations};
use fieldsage_domain::{EntityAnchor, FieldDescriptor, LifecycleSlot, UrlCache};
use fieldsage_search::{SearchProvider, SearchQuery, SearchResponse};
use tracing::{debug, info, warn};

/// Where a piece of evidence came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Citations verified against the vendor domain
    Official,
    /// Third-party or unverifiable sources
    Fallback,
}

impl Provenance {
    /// Confidence to use when a value is taken straight from this evidence
    pub fn default_confidence(self) -> f64 {
        match self {
            Provenance::Official => 0.9,
            Provenance::Fallback => 0.6,
        }
    }

    /// Tag shown in the prompt
    pub fn tag(self) -> &'static str {
        match self {
            Provenance::Official => "VERIFIED OFFICIAL SOURCE",
            Provenance::Fallback => "WARNING: NON-OFFICIAL SOURCE, verify before use",
        }
    }
}

/// Search result attached to one field
#[derive(Debug, Clone, PartialEq)]
pub struct Evidence {
    /// Field the evidence was gathered for
    pub field_id: String,
    /// Field label
    pub field_name: String,
    /// Classified kind of the field
    pub kind: FieldKind,
    /// Answer text from the search backend
    pub text: String,
    /// Cited URLs, official ones first
    pub citations: Vec<String>,
    /// Trust level
    pub provenance: Provenance,
}

/// Everything gathered for one request
#[derive(Debug, Clone, Default)]
pub struct EvidenceSet {
    /// Evidence per field, in field order
    pub items: Vec<Evidence>,
    /// Provenance of the evidence that filled each lifecycle slot this run
    pub slot_provenance: Vec<(LifecycleSlot, Provenance)>,
}

impl EvidenceSet {
    /// Evidence for a field id
    pub fn for_field(&self, field_id: &str) -> Option<&Evidence> {
        self.items.iter().find(|e| e.field_id == field_id)
    }

    /// Provenance recorded for a slot during this run
    pub fn provenance_of(&self, slot: LifecycleSlot) -> Option<Provenance> {
        self.slot_provenance
            .iter()
            .find(|(s, _)| *s == slot)
            .map(|(_, p)| *p)
    }
}

/// Runs grounding searches for one request
pub struct EvidenceGatherer<'a> {
    search: &'a dyn SearchProvider,
    anchor: &'a EntityAnchor,
    vendor_domain: Option<&'static str>,
}

impl<'a> EvidenceGatherer<'a> {
    /// Create a gatherer pinned to `anchor`
    pub fn new(search: &'a dyn SearchProvider, anchor: &'a EntityAnchor) -> Self {
        let vendor_domain = resolve_vendor_domain(anchor);
        match vendor_domain {
            Some(domain) => debug!("Vendor domain for '{}': {}", anchor, domain),
            None => info!(
                "No known vendor domain for '{}', official-only phase skipped",
                anchor
            ),
        }
        Self {
            search,
            anchor,
            vendor_domain,
        }
    }

    /// Vendor domain resolved from the anchor
    pub fn vendor_domain(&self) -> Option<&'static str> {
        self.vendor_domain
    }

    /// Search every field that needs grounding, one after another.
    ///
    /// Date fields record their first citation into `cache` under their
    /// lifecycle slot so the paired URL field can reuse it verbatim. URL
    /// fields are never searched.
    pub async fn gather(
        &self,
        fields: &[(FieldDescriptor, FieldKind)],
        cache: &mut UrlCache,
    ) -> EvidenceSet {
        let mut set = EvidenceSet::default();

        for (field, kind) in fields {
            if !kind.needs_grounding() {
                continue;
            }
            let Some(query) = build_query(*kind, self.anchor) else {
                continue;
            };

            let Some((response, provenance)) = self.search_two_phase(&query).await else {
                debug!("No evidence for field '{}'", field.field_id);
                continue;
            };

            if let (FieldKind::LifecycleDate(slot), Some(first)) = (kind, response.citations.first()) {
                info!("Caching {} source: {}", slot.key(), first);
                cache.record(*slot, vec![first.clone()]);
                set.slot_provenance.retain(|(s, _)| s != slot);
                set.slot_provenance.push((*slot, provenance));
            }

            set.items.push(Evidence {
                field_id: field.field_id.clone(),
                field_name: field.field_name.clone(),
                kind: *kind,
                text: response.content,
                citations: response.citations,
                provenance,
            });
        }

        info!(
            "Gathered evidence for {} field(s), {} official",
            set.items.len(),
            set.items
                .iter()
                .filter(|e| e.provenance == Provenance::Official)
                .count()
        );
        set
    }

    async fn search_two_phase(&self, query: &str) -> Option<(SearchResponse, Provenance)> {
        if let Some(domain) = self.vendor_domain {
            if let Some(response) = self.search_official(query, domain).await {
                return Some((response, Provenance::Official));
            }
        }
        self.search_fallback(query).await
    }

    async fn search_official(&self, query: &str, domain: &str) -> Option<SearchResponse> {
        let request = SearchQuery::new(query, official_instructions(self.anchor, domain))
            .restricted_to(domain);

        let response = match self.search.search(&request).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Official search on {} failed: {}", domain, e);
                return None;
            }
        };

        if response.content.trim().is_empty() || response.content.contains(NOT_FOUND_SENTINEL) {
            debug!("Official search on {} returned no answer", domain);
            return None;
        }

        let verified = verified_citations(&response.citations, domain);
        if verified.is_empty() {
            warn!(
                "Official search returned {} citation(s), none on {}; rejecting",
                response.citations.len(),
                domain
            );
            return None;
        }

        Some(SearchResponse {
            content: response.content,
            citations: verified,
        })
    }

    async fn search_fallback(&self, query: &str) -> Option<(SearchResponse, Provenance)> {
        let request = SearchQuery::new(query, fallback_instructions(self.anchor));

        let response = match self.search.search(&request).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Fallback search failed: {}", e);
                return None;
            }
        };

        if response.content.trim().is_empty() && response.citations.is_empty() {
            return None;
        }

        let official = self
            .vendor_domain
            .map(|domain| verified_citations(&response.citations, domain))
            .unwrap_or_default();

        if official.is_empty() {
            return Some((response, Provenance::Fallback));
        }

        // Official citations first so the cached URL is the vendor's own page
        let mut citations = official;
        for url in response.citations {
            if !citations.contains(&url) {
                citations.push(url);
            }
        }
        Some((
            SearchResponse {
                content: response.content,
                citations,
            },
            Provenance::Official,
        ))
    }
}
