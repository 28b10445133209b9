//! Fieldsage Orchestrator
//!
//! Turns a batch of catalog field descriptors into per-field value
//! suggestions, anchored to one confirmed component name.
//!
//! # Architecture
//!
//! ```text
//! Fields → classify → anchor → evidence (search) → prompt → model → parse → guard
//!                                   ↓                                       ↑
//!                                URL cache ─────────────────────────────────┘
//! ```
//!
//! # Key Features
//!
//! - **Entity anchor**: every search and every answer is pinned to one
//!   `[Provider] [Product] [Version]` name; an empty name field with no anchor
//!   short-circuits without calling anything
//! - **Two-phase grounding**: vendor-domain-only search first, unrestricted
//!   fallback second, each tagged with its provenance
//! - **URL pairing**: lifecycle URL fields are never searched and always reuse
//!   the source cached by their date field
//! - **One model call per batch**
//!
//! # Example Usage
//!
//! ```no_run
//! use fieldsage_orchestrator::{Orchestrator, OrchestratorConfig, RecommendationRequest};
//! use fieldsage_domain::FieldDescriptor;
//! use fieldsage_llm::MockChatModel;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let orchestrator = Orchestrator::new(Arc::new(MockChatModel::default()), OrchestratorConfig::default());
//!
//! let request = RecommendationRequest {
//!     fields: vec![FieldDescriptor::new("name", "Name", "MongoDB Community Server 8.2")],
//!     page_context: None,
//!     component_name: None,
//!     cached_urls: Default::default(),
//! };
//!
//! let response = orchestrator.recommend(request).await?;
//! println!("{} recommendation(s)", response.recommendations.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod evidence;
mod field_kind;
mod guard;
mod orchestrator;
mod parser;
mod prompt;
mod query;
mod types;
mod vendor;


pub use config::OrchestratorConfig;
pub use error::OrchestratorError;
pub use evidence::{Evidence, EvidenceGatherer, EvidenceSet, Provenance};
pub use field_kind::FieldKind;
pub use guard::{OutputGuard, UNRESOLVED_CONFIDENCE};
pub use orchestrator::{Orchestrator, NAME_REQUIRED_MESSAGE};
pub use parser::parse_recommendations;
pub use prompt::PromptBuilder;
pub use query::{build_query, NOT_FOUND_SENTINEL};
pub use types::{RecommendationRequest, RecommendationResponse};
pub use vendor::{host_matches, resolve_vendor_domain};
