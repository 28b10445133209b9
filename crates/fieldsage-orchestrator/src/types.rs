//! Request and response types for recommendation generation

use fieldsage_domain::{FieldDescriptor, Recommendation, UrlCache};
use serde::{Deserialize, Serialize};

/// Request to generate recommendations for a batch of fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    /// Fields scraped from the page
    pub fields: Vec<FieldDescriptor>,

    /// Page title or other context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_context: Option<String>,

    /// Previously confirmed component name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_name: Option<String>,

    /// Lifecycle URLs returned by the previous response
    #[serde(default)]
    pub cached_urls: UrlCache,
}

/// Result of a recommendation run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResponse {
    /// One entry per field the model (or a shortcut) answered
    pub recommendations: Vec<Recommendation>,

    /// Incoming cache merged with any freshly sourced lifecycle URLs
    pub cached_urls: UrlCache,
}
