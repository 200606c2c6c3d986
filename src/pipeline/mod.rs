//! Per-run orchestration.
//!
//! For every source, in identifier order:
//!
//! ```text
//! load snapshot → fetch → diff → (publish) → deliver → wait for pickup → save snapshot
//! ```
//!
//! A source's snapshot is only replaced after its items were accepted by the
//! sink and every published document was fetched at least once, so an item
//! is never recorded as seen before it has been delivered.

mod summary;

pub use summary::RunSummary;

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{error, info, info_span, warn, Instrument};

use crate::app::{FeedPocketError, Result};
use crate::diff::diff;
use crate::domain::{FeedSnapshot, NewItem, Source};
use crate::email::{self, Mailbox};
use crate::fetcher::Fetcher;
use crate::normalizer::Normalizer;
use crate::server::{render_document, ContentServer, PublishedDocument};
use crate::sink::DeliverySink;
use crate::store::SnapshotStore;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Count new items but deliver nothing and persist nothing.
    pub dry_run: bool,
    /// Bound for waiting on served documents; `None` waits indefinitely.
    pub pickup_timeout: Option<Duration>,
}

/// How one source ended for this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    /// Nothing new; the snapshot was left untouched.
    NoNewItems,
    DryRun { items: usize },
    Delivered { items: usize, persisted: bool },
    /// The sink rejected a batch; `accepted` items made it before that.
    DeliveryFailed { items: usize, accepted: usize },
    /// Delivered, but not every served document was fetched in time.
    PickupTimedOut { items: usize },
}

pub struct Pipeline {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    normalizer: Normalizer,
    store: Arc<dyn SnapshotStore + Send + Sync>,
    sink: Arc<dyn DeliverySink + Send + Sync>,
    server: Option<ContentServer>,
    options: RunOptions,
}

impl Pipeline {
    pub fn new(
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        store: Arc<dyn SnapshotStore + Send + Sync>,
        sink: Arc<dyn DeliverySink + Send + Sync>,
        options: RunOptions,
    ) -> Self {
        Self {
            fetcher,
            normalizer: Normalizer::new(),
            store,
            sink,
            server: None,
            options,
        }
    }

    pub fn with_server(mut self, server: ContentServer) -> Self {
        self.server = Some(server);
        self
    }

    pub fn server(&self) -> Option<&ContentServer> {
        self.server.as_ref()
    }

    /// Process every source, isolating failures to the source they happen in.
    pub async fn run_sources(&self, sources: &[Source], summary: &mut RunSummary) {
        let mut ordered: Vec<&Source> = sources.iter().collect();
        ordered.sort_by(|a, b| a.id.cmp(&b.id));

        for source in ordered {
            summary.sources += 1;
            info!(
                id = %source.id,
                url = %source.url,
                "Processing rss source {}",
                source.display_name()
            );

            let span = info_span!("source", id = %source.id);
            match self.process_source(source).instrument(span).await {
                Ok(outcome) => summary.record(&outcome),
                Err(e) => {
                    summary.sources_failed += 1;
                    error!("processing rss source({}): {}", source.id, e);
                }
            }
        }
    }

    /// Run the whole per-source sequence for one source.
    pub async fn process_source(&self, source: &Source) -> Result<SourceOutcome> {
        let previous = self.store.load(&source.id)?;

        info!(url = %source.url, "Downloading new feed");
        let body = self.fetcher.fetch(&source.url).await?;
        let (meta, candidates) = self.normalizer.normalize(&body)?;
        if let Some(title) = &meta.title {
            tracing::debug!(title = %title, "Parsed feed");
        }

        let mut items = diff(previous.as_ref(), &candidates, source.cutoff, &source.id);
        info!(count = items.len(), "Found new items");
        if items.is_empty() {
            return Ok(SourceOutcome::NoNewItems);
        }

        if self.options.dry_run {
            info!("Skip adding to pocket because of dry-run mode");
            return Ok(SourceOutcome::DryRun { items: items.len() });
        }

        let documents = if source.use_server {
            self.publish(&mut items)?
        } else {
            Vec::new()
        };

        if let Err(e) = self
            .sink
            .deliver(&items)
            .instrument(info_span!("deliver"))
            .await
        {
            error!("calling Pocket API to add new items: {}", e);
            return Ok(SourceOutcome::DeliveryFailed {
                items: items.len(),
                accepted: e.accepted,
            });
        }

        if !self.wait_for_pickup(&documents).await {
            return Ok(SourceOutcome::PickupTimedOut { items: items.len() });
        }

        let persisted = match self
            .store
            .save(&source.id, &FeedSnapshot::from_candidates(&candidates))
        {
            Ok(()) => true,
            Err(e) => {
                error!("saving new snapshot: {}", e);
                false
            }
        };

        Ok(SourceOutcome::Delivered {
            items: items.len(),
            persisted,
        })
    }

    /// Publish every item and point its URL at the served copy.
    fn publish(&self, items: &mut [NewItem]) -> Result<Vec<PublishedDocument>> {
        let server = self.server.as_ref().ok_or_else(|| {
            FeedPocketError::Config("source requires the content server, but it is not running".into())
        })?;

        items
            .iter_mut()
            .map(|item| {
                let document = server.publish(&item.id, render_document(item))?;
                item.url = document.url().to_string();
                Ok(document)
            })
            .collect()
    }

    /// `true` once every document was fetched; `false` if the pickup timeout hit first.
    async fn wait_for_pickup(&self, documents: &[PublishedDocument]) -> bool {
        if documents.is_empty() {
            return true;
        }

        info!(count = documents.len(), "Waiting for served content to be fetched");
        let all = join_all(documents.iter().map(PublishedDocument::wait_fetched));

        match self.options.pickup_timeout {
            None => {
                all.await;
                true
            }
            Some(limit) => {
                if tokio::time::timeout(limit, all).await.is_ok() {
                    return true;
                }
                let pending = documents.iter().filter(|d| !d.is_fetched()).count();
                warn!(
                    pending,
                    "Served content was not fetched within {}s; keeping the old snapshot",
                    limit.as_secs()
                );
                false
            }
        }
    }

    /// Deliver notification emails and archive the ones that were delivered.
    pub async fn run_mailbox(&self, mailbox: &(dyn Mailbox + Send + Sync), summary: &mut RunSummary) {
        async {
            summary.sources += 1;
            let notifications =
                match email::collect_notifications(mailbox, self.fetcher.as_ref()).await {
                    Ok(notifications) => notifications,
                    Err(e) => {
                        summary.sources_failed += 1;
                        error!("reading notification emails: {}", e);
                        return;
                    }
                };

            if notifications.is_empty() {
                return;
            }
            summary.new_items += notifications.len();

            if self.options.dry_run {
                info!("Skip adding to pocket because of dry-run mode");
                return;
            }

            let items: Vec<NewItem> = notifications.iter().map(|n| n.item.clone()).collect();
            if let Err(e) = self.sink.deliver(&items).await {
                summary.delivered += e.accepted;
                summary.failed += items.len() - e.accepted;
                error!("consuming new email items: {}", e);
                return;
            }
            summary.delivered += items.len();

            let uids: Vec<u32> = notifications.iter().map(|n| n.uid).collect();
            match mailbox.archive(&uids).await {
                Ok(()) => info!("Archive {} emails", uids.len()),
                Err(e) => error!("archiving consumed email items: {}", e),
            }
        }
        .instrument(info_span!("mailbox"))
        .await
    }

    /// Stop the content server if one was started. Shutdown problems are
    /// logged, never escalated.
    pub async fn finish(self) {
        if let Some(server) = self.server {
            if let Err(e) = server.shutdown().await {
                error!("{}", e);
            }
        }
    }
}
