//! Search query templates, one per grounded field kind

use crate::field_kind::FieldKind;
use fieldsage_domain::{EntityAnchor, LifecycleSlot};

/// Reply the official-only phase must give when the vendor site is silent
pub const NOT_FOUND_SENTINEL: &str = "NOT_FOUND";

/// Build the search question for a field
///
/// Returns `None` for kinds that are never searched.
pub fn build_query(kind: FieldKind, anchor: &EntityAnchor) -> Option<String> {
    let name = anchor.as_str();
    let query = match kind {
        FieldKind::LifecycleDate(LifecycleSlot::ActiveDate) => format!(
            "What is the official release (general availability) date of {name}? \
             Answer with the date in YYYY-MM-DD format and cite the page that states it."
        ),
        FieldKind::LifecycleDate(LifecycleSlot::EndOfSaleDate) => format!(
            "What is the official end of sale (end of marketing / end of availability) date of {name}? \
             Answer with the date in YYYY-MM-DD format and cite the lifecycle page that states it."
        ),
        FieldKind::LifecycleDate(LifecycleSlot::EndOfSupportDate) => format!(
            "What is the official end of support (end of life) date of {name}? \
             Answer with the date in YYYY-MM-DD format and cite the support policy or lifecycle page that states it."
        ),
        FieldKind::Lifecycle => format!(
            "What are the official lifecycle dates (release, end of sale, end of support) of {name}?"
        ),
        FieldKind::Description => format!(
            "Give a short factual description of what {name} is and what it is used for."
        ),
        FieldKind::Website => format!("What is the official product homepage URL of {name}?"),
        FieldKind::Provider => format!(
            "Which company develops, publishes and supports {name}? Give the company name only."
        ),
        FieldKind::Category => format!(
            "What type of software or technology category is {name} (for example database, \
             operating system, middleware, web server)?"
        ),
        FieldKind::Name | FieldKind::LifecycleUrl(_) | FieldKind::Other => return None,
    };
    Some(query)
}

/// Instructions for the official-only phase
pub fn official_instructions(anchor: &EntityAnchor, domain: &str) -> String {
    format!(
        "You answer questions about {anchor} using ONLY pages published on {domain}. \
         Do not use or cite any other website. Answer strictly about {anchor}, not other \
         editions or versions. If {domain} does not state the answer, reply with exactly \
         {NOT_FOUND_SENTINEL} and nothing else."
    )
}

/// Instructions for the unrestricted fallback phase
pub fn fallback_instructions(anchor: &EntityAnchor) -> String {
    format!(
        "You answer questions about {anchor}. Prefer official vendor documentation, then \
         reputable lifecycle trackers. Answer strictly about {anchor}, not other editions or \
         versions. Always cite your sources. If the answer is unknown, say so."
    )
}
