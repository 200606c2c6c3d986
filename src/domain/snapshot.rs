use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::CandidateItem;

/// The identifying fields of one entry as it existed at the last successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEntry {
    #[serde(default)]
    pub guid: String,
    #[serde(default)]
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Last-persisted state of a source; the baseline for detecting new items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSnapshot {
    #[serde(default)]
    pub entries: Vec<FeedEntry>,
}

impl FeedSnapshot {
    /// Capture the freshly fetched feed, in feed order.
    pub fn from_candidates(items: &[CandidateItem]) -> Self {
        let entries = items
            .iter()
            .map(|item| FeedEntry {
                guid: item.guid.clone(),
                link: item.link.clone(),
                timestamp: item.effective_time(),
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_guid(&self, guid: &str) -> bool {
        !guid.is_empty() && self.entries.iter().any(|e| e.guid == guid)
    }

    pub fn contains_link(&self, link: &str) -> bool {
        !link.is_empty() && self.entries.iter().any(|e| e.link == link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_from_candidates_keeps_order_and_keys() {
        let items = vec![
            CandidateItem {
                guid: "g1".into(),
                link: "https://example.com/1".into(),
                updated: Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()),
                ..Default::default()
            },
            CandidateItem {
                link: "https://example.com/2".into(),
                ..Default::default()
            },
        ];

        let snapshot = FeedSnapshot::from_candidates(&items);
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.entries[0].guid, "g1");
        assert_eq!(snapshot.entries[0].timestamp, items[0].updated);
        assert_eq!(snapshot.entries[1].link, "https://example.com/2");
        assert!(snapshot.entries[1].timestamp.is_none());
    }

    #[test]
    fn test_contains_ignores_empty_keys() {
        let snapshot = FeedSnapshot {
            entries: vec![FeedEntry::default()],
        };
        assert!(!snapshot.contains_guid(""));
        assert!(!snapshot.contains_link(""));
    }

    #[test]
    fn test_deserializes_with_missing_fields() {
        let snapshot: FeedSnapshot =
            serde_json::from_str(r#"{"entries":[{"link":"https://example.com/1"}]}"#).unwrap();
        assert!(snapshot.contains_link("https://example.com/1"));
        assert!(snapshot.entries[0].guid.is_empty());
    }
}
