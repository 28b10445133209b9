//! Field-kind classification from labels and ids
//!
//! The kind decides whether a field is searched, which query template it
//! gets, and which formatting rule the prompt carries for it.

use fieldsage_domain::{FieldDescriptor, LifecycleSlot};

/// What a field holds, as far as grounding is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// The component name (entity anchor)
    Name,
    /// A lifecycle date
    LifecycleDate(LifecycleSlot),
    /// The source URL paired with a lifecycle date
    LifecycleUrl(LifecycleSlot),
    /// Lifecycle information that is not one of the three slots
    Lifecycle,
    /// Free-text description
    Description,
    /// Vendor website / homepage
    Website,
    /// Providing company
    Provider,
    /// Product category
    Category,
    /// Anything else
    Other,
}

impl FieldKind {
    /// Classify a field by its label, falling back to its id
    pub fn of(field: &FieldDescriptor) -> Self {
        match classify(&normalize(&field.field_name)) {
            FieldKind::Other => classify(&normalize(&field.field_id)),
            kind => kind,
        }
    }

    /// Whether the field gets its own web search
    pub fn needs_grounding(self) -> bool {
        matches!(
            self,
            FieldKind::LifecycleDate(_)
                | FieldKind::Lifecycle
                | FieldKind::Description
                | FieldKind::Website
                | FieldKind::Provider
                | FieldKind::Category
        )
    }

    /// Lifecycle slot of a date or URL field
    pub fn slot(self) -> Option<LifecycleSlot> {
        match self {
            FieldKind::LifecycleDate(slot) | FieldKind::LifecycleUrl(slot) => Some(slot),
            _ => None,
        }
    }
}

/// Lowercase, split camelCase, turn separators into spaces
pub(crate) fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 8);
    let mut prev_lower = false;
    for c in raw.chars() {
        if c == '_' || c == '-' || c == '.' || c == ':' {
            out.push(' ');
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower {
            out.push(' ');
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        out.extend(c.to_lowercase());
    }
    format!(" {} ", out.split_whitespace().collect::<Vec<_>>().join(" "))
}

fn has(text: &str, phrase: &str) -> bool {
    text.contains(&format!(" {} ", phrase))
}

fn slot_of(text: &str) -> Option<LifecycleSlot> {
    if ["end of sale", "end of sales", "end of marketing"]
        .iter()
        .any(|p| has(text, p))
    {
        return Some(LifecycleSlot::EndOfSaleDate);
    }
    if [
        "end of support",
        "end of standard support",
        "end of extended support",
        "end of life",
        "eol",
        "eos",
        "eosl",
    ]
    .iter()
    .any(|p| has(text, p))
    {
        return Some(LifecycleSlot::EndOfSupportDate);
    }
    if ["active date", "active from", "release date", "general availability", "ga date"]
        .iter()
        .any(|p| has(text, p))
    {
        return Some(LifecycleSlot::ActiveDate);
    }
    None
}

fn classify(text: &str) -> FieldKind {
    if let Some(slot) = slot_of(text) {
        return if has(text, "url") || has(text, "link") {
            FieldKind::LifecycleUrl(slot)
        } else {
            FieldKind::LifecycleDate(slot)
        };
    }
    if has(text, "lifecycle") || has(text, "life cycle") {
        return FieldKind::Lifecycle;
    }
    if has(text, "description") {
        return FieldKind::Description;
    }
    if ["website", "web site", "homepage", "home page"]
        .iter()
        .any(|p| has(text, p))
    {
        return FieldKind::Website;
    }
    if ["provider", "vendor", "manufacturer"].iter().any(|p| has(text, p)) {
        return FieldKind::Provider;
    }
    if has(text, "category") {
        return FieldKind::Category;
    }
    if [" name ", " display name ", " component name ", " full name "].contains(&text) {
        return FieldKind::Name;
    }
    FieldKind::Other
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(name: &str, id: &str) -> FieldKind {
        FieldKind::of(&FieldDescriptor::new(id, name, ""))
    }

    #[test]
    fn test_normalize_splits_camel_case_and_separators() {
        assert_eq!(normalize("endOfSupportDate"), " end of support date ");
        assert_eq!(normalize("active_date-url"), " active date url ");
        assert_eq!(normalize("  Active  Date "), " active date ");
    }

    #[test]
    fn test_lifecycle_dates_and_urls() {
        assert_eq!(
            kind("Active Date", "x1"),
            FieldKind::LifecycleDate(LifecycleSlot::ActiveDate)
        );
        assert_eq!(
            kind("Active Date URL", "x2"),
            FieldKind::LifecycleUrl(LifecycleSlot::ActiveDate)
        );
        assert_eq!(
            kind("New End of Sale Date", "x3"),
            FieldKind::LifecycleDate(LifecycleSlot::EndOfSaleDate)
        );
        assert_eq!(
            kind("End of Standard Support URL", "x4"),
            FieldKind::LifecycleUrl(LifecycleSlot::EndOfSupportDate)
        );
    }

    #[test]
    fn test_eos_abbreviation_is_end_of_support() {
        assert_eq!(
            kind("EOS Date", "x"),
            FieldKind::LifecycleDate(LifecycleSlot::EndOfSupportDate)
        );
        assert_eq!(
            kind("EOS URL", "y"),
            FieldKind::LifecycleUrl(LifecycleSlot::EndOfSupportDate)
        );
        assert_eq!(
            kind("End of Sale Date", "eos"),
            FieldKind::LifecycleDate(LifecycleSlot::EndOfSaleDate)
        );
    }

    #[test]
    fn test_falls_back_to_id() {
        assert_eq!(
            kind("", "endOfSupportDate"),
            FieldKind::LifecycleDate(LifecycleSlot::EndOfSupportDate)
        );
        assert_eq!(kind("Field 7", "name"), FieldKind::Name);
    }

    #[test]
    fn test_other_kinds() {
        assert_eq!(kind("Name", "n"), FieldKind::Name);
        assert_eq!(kind("Description", "d"), FieldKind::Description);
        assert_eq!(kind("Website URL", "w"), FieldKind::Website);
        assert_eq!(kind("Provider", "p"), FieldKind::Provider);
        assert_eq!(kind("IT Component Category", "c"), FieldKind::Category);
        assert_eq!(kind("Lifecycle", "l"), FieldKind::Lifecycle);
        assert_eq!(kind("Owner", "o"), FieldKind::Other);
        assert_eq!(kind("Product Name Alias", "q"), FieldKind::Other);
    }

    #[test]
    fn test_grounding_flags() {
        assert!(FieldKind::LifecycleDate(LifecycleSlot::ActiveDate).needs_grounding());
        assert!(!FieldKind::LifecycleUrl(LifecycleSlot::ActiveDate).needs_grounding());
        assert!(!FieldKind::Name.needs_grounding());
        assert!(!FieldKind::Other.needs_grounding());
    }
}
