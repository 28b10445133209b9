//! Lifecycle source-URL cache
//!
//! Populated when a date-bearing field search returns citations and consumed
//! by the paired "...URL" field, so a date and its URL always cite the same
//! source. The backend keeps no copy: the caller persists the cache and sends
//! it back with the next request.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The three fixed lifecycle slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LifecycleSlot {
    /// Release / active date
    ActiveDate,
    /// End of sale date
    EndOfSaleDate,
    /// End of (standard) support date
    EndOfSupportDate,
}

impl LifecycleSlot {
    /// Cache key used on the wire
    pub fn key(self) -> &'static str {
        match self {
            LifecycleSlot::ActiveDate => "active_date",
            LifecycleSlot::EndOfSaleDate => "end_of_sale_date",
            LifecycleSlot::EndOfSupportDate => "end_of_support_date",
        }
    }

    /// Human label, as used in prompts
    pub fn label(self) -> &'static str {
        match self {
            LifecycleSlot::ActiveDate => "Active Date",
            LifecycleSlot::EndOfSaleDate => "End of Sale Date",
            LifecycleSlot::EndOfSupportDate => "End of Support Date",
        }
    }
}

/// Map of lifecycle key to source URLs.
///
/// Serialized as a plain JSON object. Keys outside the three lifecycle slots
/// are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UrlCache(BTreeMap<String, Vec<String>>);

impl UrlCache {
    /// Empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// URLs cached for a slot, empty when none
    pub fn urls(&self, slot: LifecycleSlot) -> &[String] {
        self.0.get(slot.key()).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First cached URL for a slot
    pub fn primary(&self, slot: LifecycleSlot) -> Option<&str> {
        self.urls(slot).first().map(String::as_str)
    }

    /// Store URLs for a slot, replacing that slot only.
    ///
    /// Empty and duplicate URLs are dropped; an empty list leaves the slot
    /// unchanged.
    pub fn record(&mut self, slot: LifecycleSlot, urls: impl IntoIterator<Item = String>) {
        let mut cleaned: Vec<String> = Vec::new();
        for url in urls {
            let url = url.trim().to_string();
            if !url.is_empty() && !cleaned.contains(&url) {
                cleaned.push(url);
            }
        }
        if !cleaned.is_empty() {
            self.0.insert(slot.key().to_string(), cleaned);
        }
    }

    /// Merge another cache into this one, key by key.
    ///
    /// Keys present in `other` win; keys only present here are kept.
    pub fn merge(&mut self, other: UrlCache) {
        for (key, urls) in other.0 {
            if !urls.is_empty() {
                self.0.insert(key, urls);
            }
        }
    }

    /// Whether no slot holds a URL
    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }
}

impl From<BTreeMap<String, Vec<String>>> for UrlCache {
    fn from(map: BTreeMap<String, Vec<String>>) -> Self {
        Self(map)
    }
}
