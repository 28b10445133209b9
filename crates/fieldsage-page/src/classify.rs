//! Editable-control classification
//!
//! A prioritized matcher chain: the first predicate that accepts an element
//! decides its kind.

use crate::selectors::{
    compile_all, DROPDOWN_CLASS_MARKERS, EDITABLE_SELECTORS, NATIVE_INPUT, RICH_TEXT_CLASS_MARKERS,
    VENDOR_SELECT_TAGS,
};
use scraper::{ElementRef, Selector};

/// Native form control variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeKind {
    /// `<input>`
    Input,
    /// `<textarea>`
    TextArea,
    /// `<select>`
    Select,
}

/// How a field is read and written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    /// A native form control
    Native(NativeKind),
    /// A contenteditable or editor region
    RichText,
    /// A custom dropdown or combobox widget
    Dropdown,
}

impl ControlKind {
    /// Rich-text region
    pub fn is_editor(self) -> bool {
        self == ControlKind::RichText
    }

    /// Choice-list control, native or custom
    pub fn is_select_like(self) -> bool {
        matches!(self, ControlKind::Dropdown | ControlKind::Native(NativeKind::Select))
    }
}

type Matcher = fn(&ElementRef<'_>) -> Option<ControlKind>;

const MATCHERS: &[Matcher] = &[match_native_select, match_dropdown, match_rich_text, match_native];

/// Classify an element, or `None` if it is not editable
pub fn classify(el: &ElementRef<'_>) -> Option<ControlKind> {
    MATCHERS.iter().find_map(|m| m(el))
}

/// The element itself if editable, else its first editable descendant
pub fn resolve_editable<'a>(el: ElementRef<'a>) -> Option<(ElementRef<'a>, ControlKind)> {
    if let Some(kind) = classify(&el) {
        return Some((el, kind));
    }
    editable_descendant(el).map(|(_, target, kind)| (target, kind))
}

/// First editable descendant, with the selector that found it
pub fn editable_descendant<'a>(
    el: ElementRef<'a>,
) -> Option<(&'static str, ElementRef<'a>, ControlKind)> {
    compile_all(EDITABLE_SELECTORS)
        .into_iter()
        .find_map(|(raw, selector)| {
            el.select(&selector)
                .filter(|d| d.id() != el.id())
                .find_map(|d| classify(&d).map(|kind| (raw, d, kind)))
        })
}

/// Nearest ancestor (or self) classified as `kind`
pub fn closest_of_kind<'a>(el: ElementRef<'a>, kind: ControlKind) -> Option<ElementRef<'a>> {
    std::iter::once(el)
        .chain(el.ancestors().filter_map(ElementRef::wrap))
        .find(|a| classify(a) == Some(kind))
}

/// Whether the element sits inside a custom dropdown (not counting itself)
pub fn inside_dropdown(el: &ElementRef<'_>) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| match_dropdown(&a).is_some())
}

/// Whether the element sits inside a rich-text region (not counting itself)
pub fn inside_rich_text(el: &ElementRef<'_>) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| match_rich_text(&a).is_some())
}

fn match_native_select(el: &ElementRef<'_>) -> Option<ControlKind> {
    (el.value().name() == "select").then_some(ControlKind::Native(NativeKind::Select))
}

fn match_dropdown(el: &ElementRef<'_>) -> Option<ControlKind> {
    let e = el.value();
    let tag = e.name();
    if tag == "select" || tag == "option" || tag == "button" {
        return None;
    }

    let role = e.attr("role").unwrap_or_default();
    let by_role = role == "combobox" || role == "listbox";
    let by_popup = e
        .attr("aria-haspopup")
        .is_some_and(|v| !v.eq_ignore_ascii_case("false"));
    // aria-expanded counts only with a popup reference
    let by_expanded = e.attr("aria-expanded").is_some()
        && (e.attr("aria-controls").is_some() || e.attr("aria-owns").is_some())
        && tag != "a"
        && role != "button"
        && role != "link";
    let by_tag = VENDOR_SELECT_TAGS.contains(&tag);
    let by_class = e
        .classes()
        .any(|c| DROPDOWN_CLASS_MARKERS.iter().any(|m| class_marks(c, m)));

    (by_role || by_popup || by_expanded || by_tag || by_class).then_some(ControlKind::Dropdown)
}

/// The class is the marker itself or ends in it after a `-` or `_` joint
fn class_marks(class: &str, marker: &str) -> bool {
    class == marker
        || class
            .strip_suffix(marker)
            .is_some_and(|prefix| prefix.ends_with('-') || prefix.ends_with('_'))
}

fn match_rich_text(el: &ElementRef<'_>) -> Option<ControlKind> {
    let e = el.value();
    if matches!(e.name(), "input" | "textarea" | "select") {
        return None;
    }
    let editable = e
        .attr("contenteditable")
        .is_some_and(|v| v.is_empty() || v.eq_ignore_ascii_case("true"));
    let textbox = e.attr("role") == Some("textbox");
    let by_class = e
        .classes()
        .any(|c| RICH_TEXT_CLASS_MARKERS.iter().any(|m| c == *m));
    (editable || textbox || by_class).then_some(ControlKind::RichText)
}

fn match_native(el: &ElementRef<'_>) -> Option<ControlKind> {
    match el.value().name() {
        "textarea" => Some(ControlKind::Native(NativeKind::TextArea)),
        "input" if native_input().is_some_and(|s| s.matches(el)) => {
            Some(ControlKind::Native(NativeKind::Input))
        }
        _ => None,
    }
}

fn native_input() -> Option<Selector> {
    crate::selectors::compile(NATIVE_INPUT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn kind_of(html: &str) -> Option<ControlKind> {
        let doc = Html::parse_fragment(html);
        let el = doc
            .root_element()
            .child_elements()
            .next()
            .unwrap();
        classify(&el)
    }

    #[test]
    fn test_native_controls() {
        assert_eq!(
            kind_of(r#"<input type="text" name="a">"#),
            Some(ControlKind::Native(NativeKind::Input))
        );
        assert_eq!(
            kind_of(r#"<textarea name="a"></textarea>"#),
            Some(ControlKind::Native(NativeKind::TextArea))
        );
        assert_eq!(
            kind_of(r#"<select name="a"><option>x</option></select>"#),
            Some(ControlKind::Native(NativeKind::Select))
        );
        assert_eq!(kind_of(r#"<input type="checkbox" name="a">"#), None);
        assert_eq!(kind_of(r#"<input type="hidden" name="a">"#), None);
    }

    #[test]
    fn test_rich_text_and_dropdown() {
        assert_eq!(kind_of(r#"<div contenteditable="true"></div>"#), Some(ControlKind::RichText));
        assert_eq!(kind_of(r#"<div class="ql-editor"></div>"#), Some(ControlKind::RichText));
        assert_eq!(kind_of(r#"<div role="combobox"></div>"#), Some(ControlKind::Dropdown));
        assert_eq!(kind_of(r#"<div aria-haspopup="listbox"></div>"#), Some(ControlKind::Dropdown));
        assert_eq!(kind_of(r#"<lx-single-select></lx-single-select>"#), Some(ControlKind::Dropdown));
        assert_eq!(kind_of(r#"<div class="category-dropdown"></div>"#), Some(ControlKind::Dropdown));
        assert_eq!(kind_of(r#"<div class="form-field"></div>"#), None);
    }

    #[test]
    fn test_dropdown_detection_is_narrow() {
        assert_eq!(kind_of(r#"<div class="accordion" aria-expanded="false"></div>"#), None);
        assert_eq!(kind_of(r#"<div class="dropdown-menu"></div>"#), None);
        assert_eq!(kind_of(r#"<div class="nodropdownhere"></div>"#), None);
        assert_eq!(kind_of(r#"<div class="lx-select-option"></div>"#), None);
        assert_eq!(
            kind_of(r#"<div aria-expanded="false" aria-controls="menu-1"></div>"#),
            Some(ControlKind::Dropdown)
        );
        assert_eq!(kind_of(r#"<div class="dropdown"></div>"#), Some(ControlKind::Dropdown));
        assert_eq!(kind_of(r#"<div class="my-custom-select"></div>"#), Some(ControlKind::Dropdown));
    }

    #[test]
    fn test_combobox_input_is_dropdown() {
        assert_eq!(
            kind_of(r#"<input role="combobox" name="a">"#),
            Some(ControlKind::Dropdown)
        );
    }

    #[test]
    fn test_resolve_editable_dives_into_container() {
        let doc = Html::parse_fragment(
            r#"<div data-field-id="desc"><span>Description</span><textarea>hi</textarea></div>"#,
        );
        let container = doc.root_element().child_elements().next().unwrap();
        let (target, kind) = resolve_editable(container).unwrap();
        assert_eq!(target.value().name(), "textarea");
        assert_eq!(kind, ControlKind::Native(NativeKind::TextArea));
    }

    #[test]
    fn test_dive_prefers_dropdown_over_its_search_box() {
        let doc = Html::parse_fragment(
            r#"<div data-field-id="cat"><lx-single-select><input type="text"></lx-single-select></div>"#,
        );
        let container = doc.root_element().child_elements().next().unwrap();
        let (target, kind) = resolve_editable(container).unwrap();
        assert_eq!(target.value().name(), "lx-single-select");
        assert_eq!(kind, ControlKind::Dropdown);
    }
}
