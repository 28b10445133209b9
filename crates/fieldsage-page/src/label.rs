//! Human-readable label resolution

use crate::selectors::{compile, compile_all, css_string, CONTAINER_LABEL_SELECTORS};
use scraper::{ElementRef, Html};

/// Attributes that carry an explicit label
const EXPLICIT_LABEL_ATTRIBUTES: &[&str] = &["data-field-label", "data-label", "data-field-name"];

/// How many ancestors are searched for a container label
const CONTAINER_DEPTH: usize = 3;

/// Resolve a label for a field.
///
/// `element` is the matched node, `target` the editable control inside it
/// (often the same node). The first source that yields text wins:
/// explicit attribute, `<label for>`, a container label, the vendor id
/// transform, ARIA label, placeholder, title, then the id itself.
pub fn resolve_label(doc: &Html, element: ElementRef<'_>, target: ElementRef<'_>, field_id: &str) -> String {
    let raw = explicit_label(element)
        .or_else(|| label_for(doc, element, target))
        .or_else(|| container_label(element, target))
        .or_else(|| vendor_id_words(field_id))
        .or_else(|| attribute_label(target).or_else(|| attribute_label(element)))
        .unwrap_or_else(|| identifier_to_words(field_id));
    title_case(&raw)
}

fn explicit_label(el: ElementRef<'_>) -> Option<String> {
    EXPLICIT_LABEL_ATTRIBUTES
        .iter()
        .filter_map(|a| el.value().attr(a))
        .map(clean_label)
        .find(|s| !s.is_empty())
}

fn label_for(doc: &Html, element: ElementRef<'_>, target: ElementRef<'_>) -> Option<String> {
    [target, element]
        .iter()
        .filter_map(|e| e.value().id())
        .find_map(|id| {
            let selector = compile(&format!("label[for={}]", css_string(id)))?;
            doc.select(&selector)
                .map(|l| clean_label(&text_of(l)))
                .find(|s| !s.is_empty())
        })
}

/// Label-like element near the field, not inside the control itself
fn container_label(element: ElementRef<'_>, target: ElementRef<'_>) -> Option<String> {
    let selectors = compile_all(CONTAINER_LABEL_SELECTORS);
    let inside_control = |candidate: &ElementRef<'_>| {
        candidate.id() == target.id()
            || candidate
                .ancestors()
                .any(|a| a.id() == target.id())
    };

    // A label pointing at another control never describes this one
    let foreign = |candidate: &ElementRef<'_>| match candidate.value().attr("for") {
        Some(f) => target.value().id() != Some(f) && element.value().id() != Some(f),
        None => false,
    };

    std::iter::once(element)
        .chain(element.ancestors().filter_map(ElementRef::wrap))
        .take(CONTAINER_DEPTH + 1)
        .take_while(|scope| !matches!(scope.value().name(), "form" | "fieldset" | "body" | "html"))
        .find_map(|scope| {
            selectors.iter().find_map(|(_, selector)| {
                scope
                    .select(selector)
                    .filter(|c| !inside_control(c) && !foreign(c))
                    .map(|c| clean_label(&text_of(c)))
                    .find(|s| !s.is_empty())
            })
        })
}

fn attribute_label(el: ElementRef<'_>) -> Option<String> {
    ["aria-label", "placeholder", "title"]
        .iter()
        .filter_map(|a| el.value().attr(a))
        .map(clean_label)
        .find(|s| !s.is_empty())
}

/// Catalog ids look like `fs_lifecycle_endOfLife` or `lx-field-description`
fn vendor_id_words(field_id: &str) -> Option<String> {
    const PREFIXES: &[&str] = &["fs_", "fs-", "lx_", "lx-", "field_", "field-", "fld_", "fld-"];
    let lower = field_id.to_ascii_lowercase();
    let prefix = PREFIXES.iter().find(|p| lower.starts_with(*p))?;
    let mut rest = &field_id[prefix.len()..];
    // A second marker such as `lx-field-` is stripped too
    for p in PREFIXES {
        if rest.to_ascii_lowercase().starts_with(p) {
            rest = &rest[p.len()..];
            break;
        }
    }
    let words = identifier_to_words(rest);
    (!words.is_empty()).then_some(words)
}

/// `endOfSupport_date` → `end Of Support date`
pub fn identifier_to_words(id: &str) -> String {
    let mut out = String::with_capacity(id.len() + 4);
    let mut prev_lower = false;
    for c in id.chars() {
        if c == '_' || c == '-' || c == '.' {
            out.push(' ');
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower {
            out.push(' ');
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        out.push(c);
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Upper-case the first letter of every word
pub fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Collapse whitespace and drop required-field markers
fn clean_label(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .trim_end_matches(|c: char| c == '*' || c == ':' || c.is_whitespace())
        .to_string()
}

/// Visible text of an element, whitespace collapsed
pub fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}
