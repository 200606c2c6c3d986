use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An entry as it appears in the freshly fetched feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateItem {
    /// Feed-provided unique id; may be empty.
    pub guid: String,
    pub link: String,
    pub title: String,
    pub body: String,
    pub published: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

impl CandidateItem {
    /// Published time, or updated time when the feed gives no published time.
    pub fn effective_time(&self) -> Option<DateTime<Utc>> {
        self.published.or(self.updated)
    }

    /// GUID when present, otherwise the link. `None` when the entry has neither.
    pub fn identity(&self) -> Option<&str> {
        if !self.guid.is_empty() {
            Some(&self.guid)
        } else if !self.link.is_empty() {
            Some(&self.link)
        } else {
            None
        }
    }
}

/// An item confirmed new and headed for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub id: String,
    /// Destination handed to the bookmarking service.
    pub url: String,
    pub title: String,
    /// Effective timestamp in unix seconds, if the source knew one.
    pub time: Option<i64>,
    pub tags: Vec<String>,
    /// Raw body used when the item is rendered through the content server.
    pub body: String,
}

impl NewItem {
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "(Untitled)"
        } else {
            &self.title
        }
    }
}
