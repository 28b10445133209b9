//! Selector tables used for discovery, location and value lookup
//!
//! Everything here is plain data. Compilation happens per snapshot and a
//! selector that fails to parse is skipped, never fatal.

use scraper::Selector;
use tracing::warn;

/// Attributes tried, in order, to derive a field id
pub const FIELD_ID_ATTRIBUTES: &[&str] = &[
    "data-field-id",
    "data-field-name",
    "name",
    "id",
    "data-testid",
];

/// Native controls worth reporting
pub const NATIVE_INPUT: &str = "input:not([type=\"hidden\"]):not([type=\"submit\"]):not([type=\"button\"]):not([type=\"reset\"]):not([type=\"checkbox\"]):not([type=\"radio\"]):not([type=\"file\"]):not([type=\"image\"])";

/// Custom select elements rendered by the catalog application
pub const VENDOR_SELECT_TAGS: &[&str] = &[
    "lx-single-select",
    "lx-multi-select",
    "lx-fact-sheet-select",
    "lx-relation-select",
];

/// Class names that mark a custom dropdown container, whole or as a
/// `-`/`_` suffix
pub const DROPDOWN_CLASS_MARKERS: &[&str] = &[
    "dropdown",
    "select-container",
    "select__control",
    "lx-select",
    "custom-select",
];

/// Class fragments that mark a rich-text editing region
pub const RICH_TEXT_CLASS_MARKERS: &[&str] = &["ql-editor", "ProseMirror", "rich-text-editor"];

/// Ordered discovery groups. Earlier groups win when two selectors reach
/// the same field.
pub const SELECTOR_GROUPS: &[(&str, &[&str])] = &[
    ("field markers", &["[data-field-id]", "[data-field-name]"]),
    (
        "rich text",
        &[
            "[contenteditable=\"true\"]",
            "[contenteditable=\"\"]",
            ".ql-editor",
            ".ProseMirror",
            "[role=\"textbox\"]",
        ],
    ),
    ("native controls", &[NATIVE_INPUT, "textarea", "select"]),
    (
        "aria widgets",
        &[
            "[role=\"combobox\"]",
            "[role=\"listbox\"]",
            "[aria-haspopup=\"listbox\"]",
        ],
    ),
    (
        "vendor selects",
        &[
            "lx-single-select",
            "lx-multi-select",
            "lx-fact-sheet-select",
            "lx-relation-select",
        ],
    ),
];

/// Editable descendants searched when a located element is only a container.
/// Dropdown markers come first so a widget's inner search box is not picked.
pub const EDITABLE_SELECTORS: &[&str] = &[
    "lx-single-select",
    "lx-multi-select",
    "lx-fact-sheet-select",
    "lx-relation-select",
    "[role=\"combobox\"]",
    "[aria-haspopup=\"listbox\"]",
    "select",
    "textarea",
    "[contenteditable=\"true\"]",
    ".ql-editor",
    ".ProseMirror",
    "[role=\"textbox\"]",
    NATIVE_INPUT,
];

/// Sub-structures that display a custom dropdown's current selection
pub const SELECTION_DISPLAY_SELECTORS: &[&str] = &[
    ".select__single-value",
    "[class*=\"singleValue\"]",
    "[class*=\"single-value\"]",
    "[class*=\"selected-value\"]",
    ".lx-select-value",
    ".selection",
];

/// Search box inside an opened dropdown
pub const DROPDOWN_SEARCH_INPUT: &str = "input";

/// Options of an opened dropdown
pub const DROPDOWN_OPTION: &str = "[role=\"option\"]";

/// Page title candidates, in order
pub const PAGE_TITLE_SELECTORS: &[&str] = &["h1", ".page-title", "[data-testid=\"factsheet-title\"]"];

/// Label-like elements searched in a field's surrounding container
pub const CONTAINER_LABEL_SELECTORS: &[&str] = &["label", ".field-label", ".label", "[class*=\"label\"]"];

/// Parse a selector, logging and skipping it on failure
pub fn compile(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(s) => Some(s),
        Err(e) => {
            warn!("Skipping selector {:?}: {}", selector, e);
            None
        }
    }
}

/// Compile a list, dropping entries that fail to parse
pub fn compile_all(selectors: &[&'static str]) -> Vec<(&'static str, Selector)> {
    selectors
        .iter()
        .filter_map(|s| compile(s).map(|c| (*s, c)))
        .collect()
}

/// Quote a value for use inside an attribute selector
pub fn css_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\a "),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Attribute selectors that locate a field id, in precedence order
pub fn locator_candidates(field_id: &str) -> Vec<String> {
    let quoted = css_string(field_id);
    FIELD_ID_ATTRIBUTES
        .iter()
        .map(|attr| format!("[{}={}]", attr, quoted))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_tables_compile() {
        for (_, group) in SELECTOR_GROUPS {
            assert_eq!(compile_all(group).len(), group.len());
        }
        assert_eq!(compile_all(EDITABLE_SELECTORS).len(), EDITABLE_SELECTORS.len());
        assert_eq!(
            compile_all(SELECTION_DISPLAY_SELECTORS).len(),
            SELECTION_DISPLAY_SELECTORS.len()
        );
    }

    #[test]
    fn test_bad_selector_is_skipped() {
        assert!(compile("[[nope").is_none());
        assert_eq!(compile_all(&["div", "[[nope"]).len(), 1);
    }

    #[test]
    fn test_css_string_escapes() {
        assert_eq!(css_string("plain"), "\"plain\"");
        assert_eq!(css_string("a\"b\\c"), "\"a\\\"b\\\\c\"");
    }

    #[test]
    fn test_locator_candidates_follow_precedence() {
        let candidates = locator_candidates("eos");
        assert_eq!(candidates[0], "[data-field-id=\"eos\"]");
        assert_eq!(candidates[2], "[name=\"eos\"]");
        assert_eq!(candidates[3], "[id=\"eos\"]");
        assert!(candidates.iter().all(|c| compile(c).is_some()));
    }
}
