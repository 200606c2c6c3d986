use feed_rs::parser;
use html_escape::decode_html_entities;

use crate::app::{FeedPocketError, Result};
use crate::domain::CandidateItem;

#[derive(Debug, Clone)]
pub struct FeedMeta {
    pub title: Option<String>,
}

/// Turns RSS 0.9x/1.0/2.0, Atom and JSON Feed documents into candidate items.
#[derive(Clone)]
pub struct Normalizer;

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Entries come back in document order. Entries without a feed-provided
    /// id keep an empty GUID; their identity falls back to the link.
    pub fn normalize(&self, body: &[u8]) -> Result<(FeedMeta, Vec<CandidateItem>)> {
        let feed = parser::Builder::new()
            .id_generator(|_, _, _| String::new())
            .build()
            .parse(body)
            .map_err(|e| FeedPocketError::FeedParse(e.to_string()))?;

        let meta = FeedMeta {
            title: feed
                .title
                .map(|t| decode_html_entities(&t.content).to_string()),
        };

        let items = feed
            .entries
            .into_iter()
            .map(|entry| {
                let link = entry
                    .links
                    .first()
                    .map(|l| l.href.trim().to_string())
                    .unwrap_or_default();

                let body = entry
                    .content
                    .and_then(|c| c.body)
                    .or_else(|| entry.summary.map(|s| s.content))
                    .unwrap_or_default();

                CandidateItem {
                    guid: entry.id.trim().to_string(),
                    link,
                    title: entry
                        .title
                        .map(|t| decode_html_entities(&t.content).to_string())
                        .unwrap_or_default(),
                    body,
                    published: entry.published,
                    updated: entry.updated,
                }
            })
            .collect();

        Ok((meta, items))
    }
}
