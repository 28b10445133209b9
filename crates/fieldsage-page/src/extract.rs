//! Field discovery over a document snapshot

use crate::classify::{
    classify, closest_of_kind, inside_dropdown, inside_rich_text, resolve_editable, ControlKind,
    NativeKind,
};
use crate::config::PageConfig;
use crate::driver::Locator;
use crate::label::{resolve_label, text_of, title_case};
use crate::selectors::{compile, compile_all, css_string, FIELD_ID_ATTRIBUTES, PAGE_TITLE_SELECTORS, SELECTOR_GROUPS};
use crate::value::read_value;
use fieldsage_domain::FieldDescriptor;
use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, trace};

/// Page context used when no title can be found
pub const UNKNOWN_PAGE: &str = "Unknown Page";

/// Labels that identify the component-name field
const NAME_FIELD_LABELS: &[&str] = &["name", "display name", "component name", "full name"];

/// Result of a whole-page extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageData {
    /// Page title or heading
    pub page_context: String,
    /// Discovered fields, deduplicated and capped
    pub fields: Vec<FieldDescriptor>,
    /// Last focused field, if any
    pub active_field: Option<FieldDescriptor>,
}

/// Discovers and describes fields in a document
#[derive(Debug, Clone, Default)]
pub struct FieldExtractor {
    config: PageConfig,
}

impl FieldExtractor {
    /// Create an extractor
    pub fn new(config: PageConfig) -> Self {
        Self { config }
    }

    /// Configuration in use
    pub fn config(&self) -> &PageConfig {
        &self.config
    }

    /// Full extraction: context, bounded field list, active field
    ///
    /// A non-denied active field missing from the capped list is moved to
    /// the front; the list never exceeds `max_fields`.
    pub fn extract(&self, doc: &Html, active: Option<&FieldDescriptor>) -> PageData {
        let mut fields = self.discover(doc);
        fields.truncate(self.config.max_fields);

        let active = active.filter(|a| !self.config.is_denied(&a.field_name, &a.field_id));
        if let Some(active) = active {
            if !fields.iter().any(|f| f.field_id == active.field_id) {
                fields.insert(0, active.clone());
                fields.truncate(self.config.max_fields);
            }
        }

        debug!("Extracted {} field(s)", fields.len());
        PageData {
            page_context: page_context(doc),
            fields,
            active_field: active.cloned(),
        }
    }

    /// Every non-denied field in discovery order, without the cap
    pub fn discover(&self, doc: &Html) -> Vec<FieldDescriptor> {
        let mut ids = HashSet::new();
        let mut targets = HashSet::new();
        let mut fields = Vec::new();

        for (group, selectors) in SELECTOR_GROUPS {
            for (raw, selector) in compile_all(selectors) {
                for el in doc.select(&selector) {
                    let Some((target, field)) = self.describe_match(doc, el) else {
                        continue;
                    };
                    if targets.contains(&target.id()) || !ids.insert(field.field_id.clone()) {
                        continue;
                    }
                    trace!("{} ({}): {}", group, raw, field.field_id);
                    targets.insert(target.id());
                    fields.push(field);
                }
            }
        }

        // Labelled controls the selector groups did not reach
        if let Some(labels) = compile("label") {
            for label in doc.select(&labels) {
                let Some((target, kind)) = labelled_control(doc, label) else {
                    continue;
                };
                if targets.contains(&target.id()) {
                    continue;
                }
                let Some(field_id) = derive_field_id(target) else {
                    continue;
                };
                if !ids.insert(field_id.clone()) {
                    continue;
                }
                let name = match text_of(label) {
                    t if t.is_empty() => resolve_label(doc, target, target, &field_id),
                    t => title_case(t.trim_end_matches(['*', ':', ' '])),
                };
                targets.insert(target.id());
                fields.push(descriptor(field_id, name, target, kind));
            }
        }

        fields
            .into_iter()
            .filter(|f| {
                let denied = self.config.is_denied(&f.field_name, &f.field_id);
                if denied {
                    debug!("Skipping deny-listed field '{}'", f.field_id);
                }
                !denied
            })
            .collect()
    }

    /// The component-name field, if the page has one
    pub fn name_field(&self, doc: &Html) -> Option<FieldDescriptor> {
        self.discover(doc).into_iter().find(is_name_field)
    }

    /// Describe the field owning the element at `locator`, deny-listed or not
    pub fn describe_at(&self, doc: &Html, locator: &Locator) -> Option<FieldDescriptor> {
        let el = element_at(doc, locator)?;
        let (target, kind) = resolve_editable(el).or_else(|| {
            el.ancestors()
                .filter_map(ElementRef::wrap)
                .find_map(|a| classify(&a).map(|k| (a, k)))
        })?;
        self.describe_target(doc, target, kind)
    }

    /// Resolve a focus-in on `locator` to a field
    pub fn describe_focus(&self, doc: &Html, locator: &Locator) -> Option<FieldDescriptor> {
        self.describe_at(doc, locator)
    }

    /// Resolve a click: custom dropdowns and labels only
    pub fn describe_click(&self, doc: &Html, locator: &Locator) -> Option<FieldDescriptor> {
        let el = element_at(doc, locator)?;
        if let Some(widget) = closest_of_kind(el, ControlKind::Dropdown) {
            return self.describe_target(doc, widget, ControlKind::Dropdown);
        }
        let label = std::iter::once(el)
            .chain(el.ancestors().filter_map(ElementRef::wrap))
            .find(|a| a.value().name() == "label")?;
        let (target, kind) = labelled_control(doc, label)?;
        self.describe_target(doc, target, kind)
    }

    fn describe_match<'a>(
        &self,
        doc: &'a Html,
        el: ElementRef<'a>,
    ) -> Option<(ElementRef<'a>, FieldDescriptor)> {
        let field_id = derive_field_id(el)?;
        let (target, kind) = resolve_editable(el)?;

        // Search boxes of dropdowns and nodes of editors are not fields
        if target.id() == el.id() {
            let nested = match kind {
                ControlKind::Native(NativeKind::Input) => inside_dropdown(&target),
                ControlKind::RichText => inside_rich_text(&target),
                _ => false,
            };
            if nested {
                return None;
            }
        }

        let name = resolve_label(doc, el, target, &field_id);
        Some((target, descriptor(field_id, name, target, kind)))
    }

    fn describe_target(
        &self,
        doc: &Html,
        target: ElementRef<'_>,
        kind: ControlKind,
    ) -> Option<FieldDescriptor> {
        let owner = owning_element(target);
        let field_id = derive_field_id(owner).or_else(|| derive_field_id(target))?;
        let name = resolve_label(doc, owner, target, &field_id);
        Some(descriptor(field_id, name, target, kind))
    }
}

/// Whether a descriptor is the component-name field
pub fn is_name_field(field: &FieldDescriptor) -> bool {
    let label = field.field_name.trim().to_lowercase();
    let id = field.field_id.trim().to_lowercase();
    NAME_FIELD_LABELS.contains(&label.as_str())
        || NAME_FIELD_LABELS
            .iter()
            .any(|n| n.replace(' ', "") == id.replace(['_', '-'], ""))
}

/// Page heading, then document title, then a placeholder
pub fn page_context(doc: &Html) -> String {
    PAGE_TITLE_SELECTORS
        .iter()
        .chain(std::iter::once(&"title"))
        .filter_map(|s| compile(s))
        .find_map(|selector| {
            doc.select(&selector)
                .next()
                .map(text_of)
                .filter(|t| !t.is_empty())
        })
        .unwrap_or_else(|| UNKNOWN_PAGE.to_string())
}

/// First present, non-empty id attribute in precedence order
pub fn derive_field_id(el: ElementRef<'_>) -> Option<String> {
    FIELD_ID_ATTRIBUTES
        .iter()
        .filter_map(|a| el.value().attr(a))
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

/// Element addressed by a locator; bad selectors match nothing
pub fn element_at<'a>(doc: &'a Html, locator: &Locator) -> Option<ElementRef<'a>> {
    let selector = compile(locator.as_str())?;
    doc.select(&selector).nth(locator.index())
}

fn descriptor(field_id: String, field_name: String, target: ElementRef<'_>, kind: ControlKind) -> FieldDescriptor {
    FieldDescriptor {
        field_id,
        field_name,
        current_value: read_value(target, kind),
        is_editor: kind.is_editor(),
        is_select_like: kind.is_select_like(),
    }
}

/// Nearest marked container whose editable control is `target`
fn owning_element(target: ElementRef<'_>) -> ElementRef<'_> {
    std::iter::once(target)
        .chain(target.ancestors().filter_map(ElementRef::wrap))
        .find(|a| {
            let e = a.value();
            (e.attr("data-field-id").is_some() || e.attr("data-field-name").is_some())
                && resolve_editable(*a).is_some_and(|(t, _)| t.id() == target.id())
        })
        .unwrap_or(target)
}

/// Control a `<label>` points at, via `for=` or nesting
fn labelled_control<'a>(doc: &'a Html, label: ElementRef<'a>) -> Option<(ElementRef<'a>, ControlKind)> {
    let target = match label.value().attr("for") {
        Some(id) if !id.trim().is_empty() => {
            let selector = compile(&format!("[id={}]", css_string(id)))?;
            doc.select(&selector).next()?
        }
        _ => {
            let selector = compile("input, textarea, select")?;
            label.select(&selector).next()?
        }
    };
    resolve_editable(target)
}
