//! New-item detection.
//!
//! Compares a freshly fetched feed against the last persisted snapshot. An
//! entry is new when neither its GUID nor its link appears in the snapshot
//! and its effective time is not before the source cutoff.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::{CandidateItem, FeedSnapshot, NewItem};

/// Why a candidate was left out of the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    NoLink,
    BeforeCutoff,
    SeenGuid,
    SeenLink,
}

/// Membership sets built from a previous snapshot.
///
/// Lookups go GUID first, then link: a feed that keeps a link but rotates
/// GUIDs, or keeps GUIDs but rewrites links, still dedups correctly.
#[derive(Debug, Default)]
pub struct SeenKeys<'a> {
    guids: HashSet<&'a str>,
    links: HashSet<&'a str>,
}

impl<'a> SeenKeys<'a> {
    pub fn new(previous: Option<&'a FeedSnapshot>) -> Self {
        let mut keys = Self::default();
        for entry in previous.into_iter().flat_map(|s| s.entries.iter()) {
            if !entry.guid.is_empty() {
                keys.guids.insert(entry.guid.as_str());
            }
            if !entry.link.is_empty() {
                keys.links.insert(entry.link.as_str());
            }
        }
        keys
    }

    pub fn check(&self, item: &CandidateItem) -> Option<Skip> {
        if !item.guid.is_empty() && self.guids.contains(item.guid.as_str()) {
            Some(Skip::SeenGuid)
        } else if self.links.contains(item.link.as_str()) {
            Some(Skip::SeenLink)
        } else {
            None
        }
    }
}

/// Classify a single candidate. Cutoff is checked before dedup so the two
/// cases stay distinguishable in the logs.
pub fn classify(item: &CandidateItem, seen: &SeenKeys<'_>, cutoff: DateTime<Utc>) -> Option<Skip> {
    if item.link.is_empty() {
        return Some(Skip::NoLink);
    }
    if item.effective_time().is_some_and(|t| t < cutoff) {
        return Some(Skip::BeforeCutoff);
    }
    seen.check(item)
}

/// Ordered list of items in `current` that are new relative to `previous`.
pub fn diff(
    previous: Option<&FeedSnapshot>,
    current: &[CandidateItem],
    cutoff: DateTime<Utc>,
    source_tag: &str,
) -> Vec<NewItem> {
    debug!(
        old = previous.map_or(0, FeedSnapshot::len),
        new = current.len(),
        "Comparing items"
    );

    let seen = SeenKeys::new(previous);
    let mut items = Vec::new();

    for item in current {
        let id = item.identity().unwrap_or_default();
        match classify(item, &seen, cutoff) {
            Some(Skip::NoLink) => debug!(id, "Item has no link"),
            Some(Skip::BeforeCutoff) => debug!(
                id,
                time = %item.effective_time().map(|t| t.to_rfc3339()).unwrap_or_default(),
                cutoff = %cutoff.to_rfc3339(),
                "Item is older than the cutoff"
            ),
            Some(Skip::SeenGuid) => debug!(id, guid = %item.guid, "Item GUID matched in old feed"),
            Some(Skip::SeenLink) => debug!(id, "Item link matched in old feed"),
            None => items.push(NewItem {
                id: id.to_string(),
                url: item.link.clone(),
                title: item.title.clone(),
                time: item.effective_time().map(|t| t.timestamp()),
                tags: vec![source_tag.to_string()],
                body: item.body.clone(),
            }),
        }
    }

    items
}
