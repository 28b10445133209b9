//! In-memory page driver
//!
//! Holds a document as markup and applies writes by rewriting it with
//! `lol_html`. Scripted widget behaviour is emulated for the one pattern the
//! writer relies on: clicking a dropdown opens it, clicking an option while
//! it is open selects that option and closes it.

use crate::classify::{classify, ControlKind, NativeKind};
use crate::driver::{DomEvent, Locator, PageDriver};
use crate::error::PageError;
use crate::extract::element_at;
use crate::selectors::{compile, compile_all, DROPDOWN_OPTION, SELECTION_DISPLAY_SELECTORS};
use async_trait::async_trait;
use lol_html::html_content::ContentType;
use lol_html::{element, HtmlRewriter, Settings};
use scraper::Html;
use std::borrow::Cow;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// An event the page received, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEvent {
    /// Element the event targeted
    pub target: Locator,
    /// Event kind
    pub event: DomEvent,
}

/// Page driver over an in-memory document
#[derive(Debug, Default)]
pub struct HtmlPage {
    markup: Mutex<String>,
    events: Mutex<Vec<RecordedEvent>>,
    open_dropdown: Mutex<Option<Locator>>,
}

impl HtmlPage {
    /// Load a document
    pub fn new(markup: impl Into<String>) -> Self {
        Self {
            markup: Mutex::new(markup.into()),
            ..Self::default()
        }
    }

    /// Current markup
    pub fn markup(&self) -> String {
        lock(&self.markup).clone()
    }

    /// Replace the document, as a navigation or re-render would
    pub fn replace_markup(&self, markup: impl Into<String>) {
        *lock(&self.markup) = markup.into();
        *lock(&self.open_dropdown) = None;
    }

    /// Events received so far
    pub fn events(&self) -> Vec<RecordedEvent> {
        lock(&self.events).clone()
    }

    /// Events received by one element
    pub fn events_for(&self, target: &Locator) -> Vec<DomEvent> {
        lock(&self.events)
            .iter()
            .filter(|e| &e.target == target)
            .map(|e| e.event)
            .collect()
    }

    fn record(&self, target: &Locator, event: DomEvent) {
        lock(&self.events).push(RecordedEvent {
            target: target.clone(),
            event,
        });
    }

    /// What the locator points at, checked against the current markup
    fn inspect(&self, target: &Locator) -> Result<Inspected, PageError> {
        let markup = self.markup();
        let doc = Html::parse_document(&markup);
        let el = element_at(&doc, target).ok_or_else(|| PageError::NotFound(target.to_string()))?;

        let option_index = match compile(DROPDOWN_OPTION) {
            Some(options) if options.matches(&el) => doc.select(&options).position(|o| o.id() == el.id()),
            _ => None,
        };
        let option_count = compile("option").map(|o| el.select(&o).count()).unwrap_or(0);

        Ok(Inspected {
            tag: el.value().name().to_string(),
            kind: classify(&el),
            option_index,
            option_count,
        })
    }

    fn rewrite_nth<F>(&self, selector: &str, index: usize, mut apply: F) -> Result<(), PageError>
    where
        F: FnMut(&mut lol_html::html_content::Element<'_, '_>) -> Result<(), PageError>,
    {
        let mut seen = 0usize;
        self.rewrite(selector, move |el| {
            let current = seen;
            seen += 1;
            if current == index {
                apply(el)
            } else {
                Ok(())
            }
        })
    }

    /// Run `apply` on every element matching `selector` and store the result
    fn rewrite<F>(&self, selector: &str, mut apply: F) -> Result<(), PageError>
    where
        F: FnMut(&mut lol_html::html_content::Element<'_, '_>) -> Result<(), PageError>,
    {
        selector
            .parse::<lol_html::Selector>()
            .map_err(|e| PageError::InvalidSelector(format!("{}: {}", selector, e)))?;

        let mut guard = lock(&self.markup);
        let mut output = Vec::with_capacity(guard.len());
        let mut failure: Option<PageError> = None;

        let handler = element!(selector, |el| {
            if failure.is_none() {
                if let Err(e) = apply(el) {
                    failure = Some(e);
                }
            }
            Ok(())
        });

        let mut rewriter = HtmlRewriter::new(
            Settings {
                element_content_handlers: vec![handler],
                ..Settings::default()
            },
            |chunk: &[u8]| output.extend_from_slice(chunk),
        );
        rewriter
            .write(guard.as_bytes())
            .map_err(|e| PageError::Rewrite(e.to_string()))?;
        rewriter.end().map_err(|e| PageError::Rewrite(e.to_string()))?;

        if let Some(e) = failure {
            return Err(e);
        }
        *guard = String::from_utf8(output).map_err(|e| PageError::Rewrite(e.to_string()))?;
        Ok(())
    }

    fn set_attribute_nth(&self, target: &Locator, name: &str, value: &str) -> Result<(), PageError> {
        let value = escape_ampersands(value);
        self.rewrite_nth(target.as_str(), target.index(), |el| {
            el.set_attribute(name, &value)
                .map_err(|e| PageError::Rewrite(e.to_string()))
        })
    }

    /// Emulate a scripted dropdown: open on click, select on option click
    fn click_dropdown_aware(&self, target: &Locator, inspected: &Inspected) -> Result<(), PageError> {
        if inspected.kind == Some(ControlKind::Dropdown) {
            self.set_attribute_nth(target, "aria-expanded", "true")?;
            *lock(&self.open_dropdown) = Some(target.clone());
            debug!("Opened dropdown {}", target);
            return Ok(());
        }

        let Some(chosen) = inspected.option_index else {
            return Ok(());
        };
        let Some(widget) = lock(&self.open_dropdown).take() else {
            return Ok(());
        };

        let label = {
            let markup = self.markup();
            let doc = Html::parse_document(&markup);
            element_at(&doc, target)
                .map(crate::label::text_of)
                .unwrap_or_default()
        };

        let mut position = 0usize;
        self.rewrite(DROPDOWN_OPTION, |el| {
            let selected = if position == chosen { "true" } else { "false" };
            position += 1;
            el.set_attribute("aria-selected", selected)
                .map_err(|e| PageError::Rewrite(e.to_string()))
        })?;

        // Show the choice where the widget displays its selection
        let display = {
            let markup = self.markup();
            let doc = Html::parse_document(&markup);
            element_at(&doc, &widget).and_then(|w| {
                compile_all(SELECTION_DISPLAY_SELECTORS)
                    .into_iter()
                    .find(|(_, s)| w.select(s).next().is_some())
                    .map(|(raw, _)| raw)
            })
        };
        match display {
            Some(raw) => self.rewrite_nth(&format!("{} {}", widget.as_str(), raw), 0, |el| {
                el.set_inner_content(&label, ContentType::Text);
                Ok(())
            })?,
            None => self.set_attribute_nth(&widget, "data-value", &label)?,
        }
        self.set_attribute_nth(&widget, "aria-expanded", "false")?;
        debug!("Selected option {} in {}", chosen, widget);
        Ok(())
    }
}

#[async_trait]
impl PageDriver for HtmlPage {
    async fn snapshot(&self) -> Result<String, PageError> {
        Ok(self.markup())
    }

    async fn focus(&self, target: &Locator) -> Result<(), PageError> {
        self.inspect(target)?;
        self.record(target, DomEvent::Focus);
        Ok(())
    }

    async fn click(&self, target: &Locator) -> Result<(), PageError> {
        let inspected = self.inspect(target)?;
        self.record(target, DomEvent::Click);
        self.click_dropdown_aware(target, &inspected)
    }

    async fn set_value(&self, target: &Locator, value: &str) -> Result<(), PageError> {
        let inspected = self.inspect(target)?;
        match inspected.tag.as_str() {
            "input" => self.set_attribute_nth(target, "value", value),
            "textarea" => self.rewrite_nth(target.as_str(), target.index(), |el| {
                el.set_inner_content(value, ContentType::Text);
                Ok(())
            }),
            other => Err(PageError::Driver(format!("<{}> has no value property", other))),
        }
    }

    async fn select_index(&self, target: &Locator, index: usize) -> Result<(), PageError> {
        let inspected = self.inspect(target)?;
        if inspected.kind != Some(ControlKind::Native(NativeKind::Select)) {
            return Err(PageError::Driver(format!("{} is not a <select>", target)));
        }
        if index >= inspected.option_count {
            return Err(PageError::Driver(format!(
                "option {} out of range ({} options)",
                index, inspected.option_count
            )));
        }

        // Options of earlier matches come first in document order
        let skip = {
            let markup = self.markup();
            let doc = Html::parse_document(&markup);
            let selects = compile(target.as_str());
            let options = compile("option");
            match (selects, options) {
                (Some(s), Some(o)) => doc
                    .select(&s)
                    .take(target.index())
                    .map(|sel| sel.select(&o).count())
                    .sum::<usize>(),
                _ => 0,
            }
        };
        let count = inspected.option_count;
        let mut position = 0usize;
        self.rewrite(&format!("{} option", target.as_str()), |el| {
            let current = position;
            position += 1;
            if current < skip || current >= skip + count {
                return Ok(());
            }
            if current - skip == index {
                el.set_attribute("selected", "")
                    .map_err(|e| PageError::Rewrite(e.to_string()))
            } else {
                el.remove_attribute("selected");
                Ok(())
            }
        })
    }

    async fn replace_text(&self, target: &Locator, text: &str) -> Result<(), PageError> {
        self.inspect(target)?;
        self.rewrite_nth(target.as_str(), target.index(), |el| {
            el.set_inner_content(text, ContentType::Text);
            Ok(())
        })
    }

    async fn dispatch(&self, target: &Locator, event: DomEvent) -> Result<(), PageError> {
        self.inspect(target)?;
        self.record(target, event);
        Ok(())
    }
}

struct Inspected {
    tag: String,
    kind: Option<ControlKind>,
    option_index: Option<usize>,
    option_count: usize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// lol_html escapes quotes in attribute values but leaves `&` as is, so
/// entity-like text would be decoded on the next parse
fn escape_ampersands(value: &str) -> Cow<'_, str> {
    if value.contains('&') {
        Cow::Owned(value.replace('&', "&amp;"))
    } else {
        Cow::Borrowed(value)
    }
}
