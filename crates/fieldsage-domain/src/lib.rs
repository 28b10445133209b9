//! Fieldsage Domain Layer
//!
//! Data model shared by the page-side field extractor and the backend
//! recommendation orchestrator.
//!
//! ## Key Concepts
//!
//! - **FieldDescriptor**: one editable field scraped from the page
//! - **Recommendation**: a suggested value for one field, with confidence
//! - **EntityAnchor**: the confirmed component name every search is pinned to
//! - **UrlCache**: lifecycle source URLs carried request-to-request by the caller
//!
//! Everything here is plain data plus validation. Network and DOM concerns
//! live in the other crates.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod anchor;
pub mod field;
pub mod recommendation;
pub mod url_cache;

// Re-exports for convenience
pub use anchor::{AnchorError, EntityAnchor};
pub use field::FieldDescriptor;
pub use recommendation::Recommendation;
pub use url_cache::{LifecycleSlot, UrlCache};
