use std::path::PathBuf;
use std::sync::Arc;

use crate::app::error::{FeedPocketError, Result};
use crate::config::Config;
use crate::email::ImapMailbox;
use crate::fetcher::{Fetcher, HttpFetcher};
use crate::pipeline::{Pipeline, RunOptions};
use crate::server::ContentServer;
use crate::sink::{DeliverySink, PocketClient};
use crate::store::{FileSnapshotStore, SnapshotStore};

/// Everything one run needs, wired from the configuration file.
pub struct AppContext {
    pub config: Config,
    pub data_dir: PathBuf,
    pub store: Arc<dyn SnapshotStore + Send + Sync>,
    pub fetcher: Arc<dyn Fetcher + Send + Sync>,
    pub sink: Arc<dyn DeliverySink + Send + Sync>,
    pub mailbox: Option<ImapMailbox>,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let data_dir = config
            .data_dir()
            .map_err(|e| FeedPocketError::Config(e.to_string()))?;

        let store: Arc<dyn SnapshotStore + Send + Sync> =
            Arc::new(FileSnapshotStore::new(&data_dir));
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::new()?);
        let sink: Arc<dyn DeliverySink + Send + Sync> =
            Arc::new(PocketClient::new(config.pocket.clone())?);
        let mailbox = config
            .email
            .is_enabled()
            .then(|| ImapMailbox::new(config.email.clone()));

        Ok(Self {
            config,
            data_dir,
            store,
            fetcher,
            sink,
            mailbox,
        })
    }

    /// Build the pipeline for this run, starting the content server only
    /// when some source delivers through it.
    pub async fn pipeline(&self, dry_run: bool) -> Result<Pipeline> {
        let server_config = &self.config.main.http_server;
        let options = RunOptions {
            dry_run,
            pickup_timeout: server_config.pickup_timeout(),
        };
        let pipeline = Pipeline::new(
            self.fetcher.clone(),
            self.store.clone(),
            self.sink.clone(),
            options,
        );

        if dry_run || !self.config.requires_server() {
            return Ok(pipeline);
        }

        let server = ContentServer::start(server_config).await?;
        Ok(pipeline.with_server(server))
    }
}
