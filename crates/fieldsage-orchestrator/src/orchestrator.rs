//! Core Orchestrator implementation

use crate::config::OrchestratorConfig;
use crate::error::OrchestratorError;
use crate::evidence::{EvidenceGatherer, EvidenceSet};
use crate::field_kind::FieldKind;
use crate::guard::OutputGuard;
use crate::parser::parse_recommendations;
use crate::prompt::PromptBuilder;
use crate::types::{RecommendationRequest, RecommendationResponse};
use fieldsage_domain::{EntityAnchor, FieldDescriptor, Recommendation, UrlCache};
use fieldsage_llm::{ChatModel, ChatRequest};
use fieldsage_search::SearchProvider;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Reasoning returned when the name field is empty and nothing anchors the request
pub const NAME_REQUIRED_MESSAGE: &str = "Enter the component name first, as \
[Provider] [Product] [Version] (for example \"MongoDB Community Server 8.2\"). \
Other fields are only suggested once the component is known.";

/// Confidence given to a name field confirmed by the anchor
const ANCHOR_CONFIDENCE: f64 = 0.95;

/// Produces per-field recommendations for one catalog record
pub struct Orchestrator {
    model: Arc<dyn ChatModel>,
    search: Option<Arc<dyn SearchProvider>>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    /// Create an orchestrator without web grounding
    pub fn new(model: Arc<dyn ChatModel>, config: OrchestratorConfig) -> Self {
        Self {
            model,
            search: None,
            config,
        }
    }

    /// Ground recommendations with a web-search backend
    pub fn with_search(mut self, search: Arc<dyn SearchProvider>) -> Self {
        self.search = Some(search);
        self
    }

    /// Whether a search backend is attached and grounding is enabled
    pub fn grounding_enabled(&self) -> bool {
        self.search.is_some() && self.config.grounding_enabled
    }

    /// Configuration in use
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Produce recommendations for every requested field.
    ///
    /// At most one model call is made per request. The returned cache is the
    /// incoming cache plus any lifecycle sources found during this run.
    pub async fn recommend(
        &self,
        request: RecommendationRequest,
    ) -> Result<RecommendationResponse, OrchestratorError> {
        validate(&request)?;

        let mut cache = request.cached_urls.clone();
        if request.fields.is_empty() {
            return Ok(RecommendationResponse {
                recommendations: Vec::new(),
                cached_urls: cache,
            });
        }

        let classified: Vec<(FieldDescriptor, FieldKind)> = request
            .fields
            .iter()
            .map(|f| (f.clone(), FieldKind::of(f)))
            .collect();

        let anchor = resolve_anchor(&request, &classified);

        info!(
            "Recommending {} field(s), anchor: {}",
            classified.len(),
            anchor.as_ref().map(|a| a.as_str()).unwrap_or("<none>")
        );

        // No anchor and an empty name field: ask for the name instead of guessing
        if anchor.is_none() {
            if let Some((field, _)) = classified
                .iter()
                .find(|(f, k)| *k == FieldKind::Name && f.is_empty())
            {
                info!("Name field '{}' is empty with no anchor; asking for a name", field.field_id);
                return Ok(RecommendationResponse {
                    recommendations: vec![name_required(field)],
                    cached_urls: cache,
                });
            }
        }

        // A confirmed anchor answers the name field directly
        let mut direct = Vec::new();
        let mut batch = Vec::with_capacity(classified.len());
        for (field, kind) in classified {
            match (&anchor, kind) {
                (Some(anchor), FieldKind::Name) => direct.push(anchored_name(&field, anchor)),
                _ => batch.push((field, kind)),
            }
        }

        if batch.is_empty() {
            debug!("Only the name field was requested; no model call needed");
            return Ok(RecommendationResponse {
                recommendations: direct,
                cached_urls: cache,
            });
        }

        let evidence = match (&anchor, &self.search) {
            (Some(anchor), Some(search)) if self.config.grounding_enabled => {
                let mut found = UrlCache::new();
                let evidence = EvidenceGatherer::new(search.as_ref(), anchor)
                    .gather(&batch, &mut found)
                    .await;
                // Fresh sources replace their slot; other cached slots are kept
                cache.merge(found);
                evidence
            }
            _ => {
                debug!("Grounding skipped");
                EvidenceSet::default()
            }
        };

        let builder = PromptBuilder::new(&batch)
            .with_anchor(anchor.as_ref())
            .with_evidence(&evidence)
            .with_cache(&cache)
            .with_page_context(request.page_context.as_deref())
            .with_limits(
                self.config.description_max_chars,
                self.config.max_evidence_chars,
            );
        let chat = ChatRequest::new(builder.build_system(), builder.build_user());
        debug!(
            "Prompt lengths: system {} chars, user {} chars",
            chat.system.len(),
            chat.user.len()
        );

        let content = self.model.complete(&chat).await.map_err(|e| {
            let err = OrchestratorError::from(e);
            match &err {
                OrchestratorError::Upstream { status, body } => {
                    error!("Model returned {}: {}", status, body)
                }
                other => warn!("Model call failed ({}): {}", self.model.model_name(), other),
            }
            err
        })?;

        let parsed = parse_recommendations(&content).inspect_err(|_| {
            error!("Could not parse model output: {}", content);
        })?;

        let guarded = OutputGuard::new(anchor.as_ref(), &cache, &evidence).apply(&batch, parsed);

        // Request order: the name field may sit anywhere among the fields
        let mut recommendations = Vec::with_capacity(direct.len() + guarded.len());
        for field in &request.fields {
            if let Some(pos) = direct.iter().position(|r| r.field_id == field.field_id) {
                recommendations.push(direct.remove(pos));
            } else if let Some(rec) = guarded.iter().find(|r| r.field_id == field.field_id) {
                recommendations.push(rec.clone());
            }
        }

        info!("Returning {} recommendation(s)", recommendations.len());
        Ok(RecommendationResponse {
            recommendations,
            cached_urls: cache,
        })
    }
}

fn validate(request: &RecommendationRequest) -> Result<(), OrchestratorError> {
    let mut seen = std::collections::HashSet::new();
    for field in &request.fields {
        if field.field_id.trim().is_empty() {
            return Err(OrchestratorError::InvalidInput(
                "Every field needs a non-empty fieldId".to_string(),
            ));
        }
        if !seen.insert(field.field_id.as_str()) {
            return Err(OrchestratorError::InvalidInput(format!(
                "Duplicate fieldId '{}'",
                field.field_id
            )));
        }
    }
    Ok(())
}

/// Anchor from the explicit component name, else from a well-formed name field
fn resolve_anchor(
    request: &RecommendationRequest,
    fields: &[(FieldDescriptor, FieldKind)],
) -> Option<EntityAnchor> {
    if let Some(name) = request.component_name.as_deref() {
        match EntityAnchor::confirm(name) {
            Ok(anchor) => return Some(anchor),
            Err(e) => warn!("Ignoring component name: {}", e),
        }
    }

    fields
        .iter()
        .filter(|(f, k)| *k == FieldKind::Name && !f.is_empty())
        .find_map(|(f, _)| EntityAnchor::confirm(&f.current_value).ok())
}

fn name_required(field: &FieldDescriptor) -> Recommendation {
    Recommendation {
        field_id: field.field_id.clone(),
        field_name: field.field_name.clone(),
        current_value: field.current_value.clone(),
        recommendation: None,
        confidence: 0.0,
        reasoning: NAME_REQUIRED_MESSAGE.to_string(),
    }
}

fn anchored_name(field: &FieldDescriptor, anchor: &EntityAnchor) -> Recommendation {
    Recommendation {
        field_id: field.field_id.clone(),
        field_name: field.field_name.clone(),
        current_value: field.current_value.clone(),
        recommendation: Some(anchor.to_string()),
        confidence: ANCHOR_CONFIDENCE,
        reasoning: format!(
            "Confirmed component name following [Provider] [Product] [Version]: {}",
            anchor
        ),
    }
}
