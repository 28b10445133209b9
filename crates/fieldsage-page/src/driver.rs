//! Page driver abstraction
//!
//! The writer talks to a page only through this trait. `HtmlPage` is the
//! in-memory implementation; a browser-automation backend would be another.

use crate::error::PageError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// CSS selector plus match index addressing one element (document order)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    selector: String,
    #[serde(default)]
    index: usize,
}

impl Locator {
    /// First match of `selector`
    pub fn new(selector: impl Into<String>) -> Self {
        Self::nth(selector, 0)
    }

    /// Match number `index` (zero-based) of `selector`
    pub fn nth(selector: impl Into<String>, index: usize) -> Self {
        Self {
            selector: selector.into(),
            index,
        }
    }

    /// Selector text
    pub fn as_str(&self) -> &str {
        &self.selector
    }

    /// Zero-based match index
    pub fn index(&self) -> usize {
        self.index
    }

    /// First descendant matching `selector`.
    ///
    /// Only meaningful on a first-match locator: the combined selector is
    /// again addressed by its first match.
    pub fn descendant(&self, selector: &str) -> Locator {
        Locator::new(format!("{} {}", self.selector, selector))
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            0 => f.write_str(&self.selector),
            n => write!(f, "{} (#{})", self.selector, n),
        }
    }
}

/// Events a write dispatches so page bindings notice the change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomEvent {
    /// `focus`
    Focus,
    /// `input`
    Input,
    /// `change`
    Change,
    /// `blur`
    Blur,
    /// `click`
    Click,
}

impl DomEvent {
    /// DOM event name
    pub fn name(self) -> &'static str {
        match self {
            DomEvent::Focus => "focus",
            DomEvent::Input => "input",
            DomEvent::Change => "change",
            DomEvent::Blur => "blur",
            DomEvent::Click => "click",
        }
    }
}

/// Primitive operations on a live page
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Current markup of the whole document
    async fn snapshot(&self) -> Result<String, PageError>;

    /// Focus an element
    async fn focus(&self, target: &Locator) -> Result<(), PageError>;

    /// Click an element
    async fn click(&self, target: &Locator) -> Result<(), PageError>;

    /// Assign `.value` through the native property setter
    async fn set_value(&self, target: &Locator, value: &str) -> Result<(), PageError>;

    /// Set `selectedIndex` of a `<select>`
    async fn select_index(&self, target: &Locator, index: usize) -> Result<(), PageError>;

    /// Select all content of an editable region and insert `text` in its place
    async fn replace_text(&self, target: &Locator, text: &str) -> Result<(), PageError>;

    /// Dispatch a bubbling event
    async fn dispatch(&self, target: &Locator, event: DomEvent) -> Result<(), PageError>;
}
