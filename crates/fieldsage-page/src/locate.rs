//! Locating a live element from a field id

use crate::classify::{classify, editable_descendant, ControlKind};
use crate::driver::Locator;
use crate::selectors::{compile, locator_candidates};
use scraper::Html;
use tracing::trace;

/// An editable control found for a field id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedField {
    /// Where the control is
    pub locator: Locator,
    /// How to write it
    pub kind: ControlKind,
}

/// Find the control for `field_id` using the id-derivation precedence.
///
/// A non-editable match is searched for an editable descendant. Candidates
/// that fail to parse or lead nowhere are skipped.
pub fn locate(doc: &Html, field_id: &str) -> Option<LocatedField> {
    locator_candidates(field_id).into_iter().find_map(|candidate| {
        let selector = compile(&candidate)?;
        let el = doc.select(&selector).next()?;

        if let Some(kind) = classify(&el) {
            return Some(LocatedField {
                locator: Locator::new(candidate),
                kind,
            });
        }

        let (raw, target, kind) = editable_descendant(el)?;
        let combined = format!("{} {}", candidate, raw);
        let index = compile(&combined)
            .and_then(|s| doc.select(&s).position(|e| e.id() == target.id()))?;
        trace!("Located '{}' inside container via {}", field_id, raw);
        Some(LocatedField {
            locator: Locator::nth(combined, index),
            kind,
        })
    })
}
