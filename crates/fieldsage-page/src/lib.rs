//! Fieldsage Page
//!
//! Discovers catalog form fields in a page, tracks which one the user is
//! on, and writes accepted values back.
//!
//! # Architecture
//!
//! ```text
//! snapshot → selector groups → classify → label / value → deny-list → cap
//!                                                                  ↑
//!                                   focus / click → ActiveFieldTracker
//!
//! applyRecommendation → locate → kind-specific write → input/change/blur
//! ```
//!
//! Reading works on parsed snapshots (`scraper`). Writing goes through the
//! `PageDriver` trait; `HtmlPage` implements it over in-memory markup.
//!
//! # Example Usage
//!
//! ```no_run
//! use fieldsage_page::{HtmlPage, PageAgent, PageConfig, PageRequest};
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let page = Arc::new(HtmlPage::new(r#"<label for="n">Name</label><input id="n">"#));
//! let agent = PageAgent::new(page, PageConfig::default());
//!
//! let reply = agent
//!     .handle(PageRequest::ApplyRecommendation {
//!         field_id: "n".to_string(),
//!         value: "Apache Kafka 3.5".to_string(),
//!     })
//!     .await;
//! println!("{}", serde_json::to_string(&reply).unwrap());
//! # }
//! ```

#![warn(missing_docs)]

mod agent;
mod classify;
mod config;
mod driver;
mod error;
mod extract;
mod html_page;
mod label;
mod locate;
mod selectors;
mod tracker;
mod value;
mod writer;

pub use agent::{
    ApplyResult, NotificationStream, PageAgent, PageNotification, PageRequest, PageResponse,
    UserEvent,
};
pub use classify::{classify, ControlKind, NativeKind};
pub use config::PageConfig;
pub use driver::{DomEvent, Locator, PageDriver};
pub use error::PageError;
pub use extract::{is_name_field, page_context, FieldExtractor, PageData, UNKNOWN_PAGE};
pub use html_page::{HtmlPage, RecordedEvent};
pub use locate::{locate, LocatedField};
pub use tracker::ActiveFieldTracker;
pub use writer::FieldWriter;
