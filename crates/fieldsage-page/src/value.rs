//! Current-value reading by control kind

use crate::classify::{ControlKind, NativeKind};
use crate::label::text_of;
use crate::selectors::{compile, compile_all, SELECTION_DISPLAY_SELECTORS};
use scraper::ElementRef;

/// Read the value a control currently shows
pub fn read_value(target: ElementRef<'_>, kind: ControlKind) -> String {
    match kind {
        ControlKind::Native(NativeKind::Input) => {
            target.value().attr("value").unwrap_or_default().to_string()
        }
        ControlKind::Native(NativeKind::TextArea) => target.text().collect::<String>(),
        ControlKind::Native(NativeKind::Select) => selected_option_text(target),
        ControlKind::RichText => text_of(target),
        ControlKind::Dropdown => dropdown_value(target),
    }
}

/// Display text of the selected option, first option when none is marked
fn selected_option_text(select: ElementRef<'_>) -> String {
    let Some(options) = compile("option") else {
        return String::new();
    };
    let mut all = select.select(&options).peekable();
    let first = all.peek().copied();
    all.find(|o| o.value().attr("selected").is_some())
        .or(first)
        .map(text_of)
        .unwrap_or_default()
}

/// Check the known "selected value" structures in priority order
fn dropdown_value(widget: ElementRef<'_>) -> String {
    let display = compile_all(SELECTION_DISPLAY_SELECTORS)
        .into_iter()
        .find_map(|(_, selector)| {
            widget
                .select(&selector)
                .map(text_of)
                .find(|t| !t.is_empty())
        });
    if let Some(text) = display {
        return text;
    }

    let selected = compile("[aria-selected=\"true\"]").and_then(|selector| {
        widget
            .select(&selector)
            .map(text_of)
            .find(|t| !t.is_empty())
    });
    if let Some(text) = selected {
        return text;
    }

    let e = widget.value();
    ["aria-valuenow", "data-value"]
        .iter()
        .filter_map(|a| e.attr(a))
        .chain((e.name() == "input").then(|| e.attr("value")).flatten())
        .map(str::trim)
        .find(|v| !v.is_empty())
        .unwrap_or_default()
        .to_string()
}
