//! Page message protocol
//!
//! Requests arrive as `{action, ...}` objects; the one unsolicited message
//! is `activeFieldChanged`, delivered through `NotificationStream`.

use crate::config::PageConfig;
use crate::driver::{Locator, PageDriver};
use crate::error::PageError;
use crate::extract::{element_at, page_context, FieldExtractor, PageData, UNKNOWN_PAGE};
use crate::locate::locate;
use crate::tracker::ActiveFieldTracker;
use crate::writer::FieldWriter;
use fieldsage_domain::FieldDescriptor;
use scraper::Html;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// A request from the host UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum PageRequest {
    /// Whole-page extraction
    GetPageData,
    /// The component-name field only
    GetNameField,
    /// The last focused field, deny-listed or not
    GetActiveField,
    /// Write a value into a field
    #[serde(rename_all = "camelCase")]
    ApplyRecommendation {
        /// Target field
        field_id: String,
        /// Value to write
        value: String,
    },
}

/// Outcome of a write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplyResult {
    /// Whether the value was written
    pub success: bool,
    /// Failure description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Reply to a `PageRequest`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PageResponse {
    /// Reply to `getPageData`
    PageData(PageData),
    /// Reply to `getNameField`
    #[serde(rename_all = "camelCase")]
    NameField {
        /// The name field, if found
        field: Option<FieldDescriptor>,
        /// Page title or heading
        page_context: String,
    },
    /// Reply to `getActiveField`
    ActiveField {
        /// The active field, if any
        field: Option<FieldDescriptor>,
    },
    /// Reply to `applyRecommendation`
    Applied(ApplyResult),
}

/// Unsolicited message pushed to the host UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum PageNotification {
    /// Focus moved to a new qualifying field
    ActiveFieldChanged {
        /// The newly active field
        field: FieldDescriptor,
    },
}

/// User interaction observed on the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserEvent {
    /// `focusin` (capture phase) on an element
    FocusIn(Locator),
    /// `click` on an element
    Click(Locator),
}

/// Serves the page message protocol over one driver
pub struct PageAgent<D: PageDriver> {
    driver: Arc<D>,
    extractor: FieldExtractor,
    writer: FieldWriter,
    tracker: ActiveFieldTracker,
}

impl<D: PageDriver> PageAgent<D> {
    /// Create an agent
    pub fn new(driver: Arc<D>, config: PageConfig) -> Self {
        Self {
            driver,
            extractor: FieldExtractor::new(config.clone()),
            writer: FieldWriter::new(config),
            tracker: ActiveFieldTracker::new(),
        }
    }

    /// The underlying driver
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Active-field state
    pub fn tracker(&self) -> &ActiveFieldTracker {
        &self.tracker
    }

    /// Answer one request. Failures become empty or unsuccessful replies.
    pub async fn handle(&self, request: PageRequest) -> PageResponse {
        debug!("Handling {:?}", request);
        match request {
            PageRequest::GetPageData => match self.page_data().await {
                Ok(data) => PageResponse::PageData(data),
                Err(e) => {
                    warn!("Page extraction failed: {}", e);
                    PageResponse::PageData(PageData {
                        page_context: UNKNOWN_PAGE.to_string(),
                        fields: Vec::new(),
                        active_field: None,
                    })
                }
            },
            PageRequest::GetNameField => match self.name_field().await {
                Ok((field, page_context)) => PageResponse::NameField { field, page_context },
                Err(e) => {
                    warn!("Name field lookup failed: {}", e);
                    PageResponse::NameField {
                        field: None,
                        page_context: UNKNOWN_PAGE.to_string(),
                    }
                }
            },
            PageRequest::GetActiveField => PageResponse::ActiveField {
                field: self.active_field().await,
            },
            PageRequest::ApplyRecommendation { field_id, value } => {
                PageResponse::Applied(self.apply(&field_id, &value).await)
            }
        }
    }

    /// Bounded, deny-filtered field list with the active field spliced in
    pub async fn page_data(&self) -> Result<PageData, PageError> {
        let markup = self.driver.snapshot().await?;
        let doc = Html::parse_document(&markup);
        let active = self.tracker.get().map(|stored| self.refresh(&doc, stored));
        Ok(self.extractor.extract(&doc, active.as_ref()))
    }

    /// The component-name field and page context
    pub async fn name_field(&self) -> Result<(Option<FieldDescriptor>, String), PageError> {
        let markup = self.driver.snapshot().await?;
        let doc = Html::parse_document(&markup);
        Ok((self.extractor.name_field(&doc), page_context(&doc)))
    }

    /// The active field with its value re-read from the page
    pub async fn active_field(&self) -> Option<FieldDescriptor> {
        let stored = self.tracker.get()?;
        let markup = match self.driver.snapshot().await {
            Ok(markup) => markup,
            Err(e) => {
                warn!("Could not refresh active field: {}", e);
                return Some(stored);
            }
        };
        let doc = Html::parse_document(&markup);
        Some(self.refresh(&doc, stored))
    }

    /// Re-read a tracked field from `doc`, keeping it as stored when it is gone
    fn refresh(&self, doc: &Html, stored: FieldDescriptor) -> FieldDescriptor {
        locate(doc, &stored.field_id)
            .and_then(|found| self.extractor.describe_at(doc, &found.locator))
            .filter(|f| f.field_id == stored.field_id)
            .unwrap_or(stored)
    }

    /// Write a value and report the outcome
    pub async fn apply(&self, field_id: &str, value: &str) -> ApplyResult {
        match self.writer.apply(self.driver.as_ref(), field_id, value).await {
            Ok(()) => ApplyResult {
                success: true,
                error: None,
            },
            Err(e) => {
                warn!("Applying to '{}' failed: {}", field_id, e);
                ApplyResult {
                    success: false,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Track a focus or click. Returns the notification to push, if any.
    pub async fn on_user_event(
        &self,
        event: UserEvent,
    ) -> Result<Option<PageNotification>, PageError> {
        let markup = self.driver.snapshot().await?;
        let field = {
            let doc = Html::parse_document(&markup);
            match &event {
                UserEvent::FocusIn(target) => self.extractor.describe_focus(&doc, target),
                UserEvent::Click(target) => {
                    if element_at(&doc, target).is_none() {
                        return Err(PageError::NotFound(target.to_string()));
                    }
                    self.extractor.describe_click(&doc, target)
                }
            }
        };

        let Some(field) = field else {
            return Ok(None);
        };
        if !self.tracker.set(field.clone()) {
            return Ok(None);
        }
        if self.denied(&field) {
            debug!("Active field '{}' is deny-listed; not announced", field.field_id);
            return Ok(None);
        }
        info!("Active field is now '{}'", field.field_id);
        Ok(Some(PageNotification::ActiveFieldChanged { field }))
    }

    /// Stream of `activeFieldChanged` notifications
    pub fn notifications(&self) -> NotificationStream {
        NotificationStream {
            rx: self.tracker.subscribe(),
            config: self.extractor.config().clone(),
        }
    }

    fn denied(&self, field: &FieldDescriptor) -> bool {
        self.extractor
            .config()
            .is_denied(&field.field_name, &field.field_id)
    }
}

/// Receiver side of the active-field relay
pub struct NotificationStream {
    rx: watch::Receiver<Option<FieldDescriptor>>,
    config: PageConfig,
}

impl NotificationStream {
    /// Next announced field change; `None` once the agent is gone
    pub async fn next(&mut self) -> Option<PageNotification> {
        loop {
            self.rx.changed().await.ok()?;
            let current = self.rx.borrow_and_update().clone();
            match current {
                Some(field) if !self.config.is_denied(&field.field_name, &field.field_id) => {
                    return Some(PageNotification::ActiveFieldChanged { field });
                }
                _ => continue,
            }
        }
    }
}
