//! Ephemeral content server.
//!
//! Publishes rendered item documents at `<base_url>/content/<key>.html` for
//! the duration of one run so the bookmarking service fetches a self-hosted
//! copy. Every document carries a [`FetchGate`] that fires on its first GET;
//! the pipeline waits on those gates before it records the items as seen.
//!
//! ```rust,ignore
//! let server = ContentServer::start(&config).await?;
//! let doc = server.publish(&item.id, render_document(&item))?;
//! // hand doc.url() to the bookmarking service ...
//! doc.wait_fetched().await;
//! server.shutdown().await?;
//! ```

mod config;
mod document;
mod gate;

pub use config::ServerConfig;
pub use document::{render_document, PublishedDocument};
pub use gate::FetchGate;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use rand::distr::Alphanumeric;
use rand::Rng;
use sha2::{Digest, Sha256};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use url::Url;

use crate::app::{FeedPocketError, Result};

use self::document::Document;

const SALT_LENGTH: usize = 8;

type DocumentMap = Arc<RwLock<HashMap<String, Arc<Document>>>>;

/// Handle to a running content server. Dropping it without calling
/// [`ContentServer::shutdown`] also stops the listener, but nothing waits for it.
pub struct ContentServer {
    base_url: Url,
    random_url: bool,
    local_addr: SocketAddr,
    shutdown_timeout: Option<Duration>,
    documents: DocumentMap,
    stop_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<std::io::Result<()>>,
}

impl ContentServer {
    /// Validate the config, bind `config.listen` and start serving in the background.
    ///
    /// Fails immediately on a malformed base URL or an address already in use.
    pub async fn start(config: &ServerConfig) -> Result<Self> {
        // Check the URL before touching the network.
        config.parsed_base_url()?;

        info!(listen = %config.listen, "Starting content HTTP server");
        let listener = TcpListener::bind(config.listen.trim()).await.map_err(|e| {
            FeedPocketError::Server(format!("listening on {}: {}", config.listen, e))
        })?;

        Self::from_listener(listener, config)
    }

    /// Serve on an already bound listener.
    pub fn from_listener(listener: TcpListener, config: &ServerConfig) -> Result<Self> {
        let base_url = config.parsed_base_url()?;
        let local_addr = listener.local_addr()?;
        let documents: DocumentMap = Arc::new(RwLock::new(HashMap::new()));

        let router = Router::new()
            .route("/content/:file", get(serve_content))
            .with_state(documents.clone());

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    // A dropped sender counts as a stop request too.
                    let _ = stop_rx.await;
                })
                .await;
            if let Err(e) = &result {
                error!("Serving http content: {}", e);
            }
            result
        });

        info!(addr = %local_addr, base_url = %base_url, "Started content HTTP server");

        Ok(Self {
            base_url,
            random_url: config.random_url,
            local_addr,
            shutdown_timeout: config.shutdown_timeout(),
            documents,
            stop_tx: Some(stop_tx),
            task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Number of documents published so far.
    pub fn len(&self) -> usize {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store `html` under a fresh content key derived from `item_id`.
    ///
    /// Publishing the same id twice yields two documents; the second one is
    /// re-keyed instead of replacing the first.
    pub fn publish(&self, item_id: &str, html: String) -> Result<PublishedDocument> {
        let salt = if self.random_url {
            random_salt()
        } else {
            String::new()
        };

        let mut documents = self
            .documents
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let mut seq = 0;
        let mut key = content_key(item_id, &salt, seq);
        while documents.contains_key(&key) {
            seq += 1;
            key = content_key(item_id, &salt, seq);
        }

        let url = self.document_url(&key)?;
        let document = Arc::new(Document {
            item_id: item_id.to_string(),
            key: key.clone(),
            url,
            body: html,
            gate: FetchGate::new(),
        });
        documents.insert(key, document.clone());

        info!(id = item_id, url = %document.url, "Serving content");
        Ok(PublishedDocument::new(document))
    }

    fn document_url(&self, key: &str) -> Result<String> {
        let file = format!("{}.html", key);
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                FeedPocketError::Config(format!(
                    "http_server.base_url cannot carry a path: {}",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(["content", file.as_str()]);
        Ok(url.to_string())
    }

    /// Stop accepting connections, let in-flight requests finish, then wait
    /// for the serving task to exit.
    pub async fn shutdown(mut self) -> Result<()> {
        info!("Shutting down content HTTP server");
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }

        let joined = match self.shutdown_timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut self.task).await {
                Ok(joined) => joined,
                Err(_) => {
                    self.task.abort();
                    return Err(FeedPocketError::Server(format!(
                        "graceful shutdown did not finish within {}s",
                        limit.as_secs()
                    )));
                }
            },
            None => (&mut self.task).await,
        };

        match joined {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(FeedPocketError::Server(format!("shutting down: {}", e))),
            Err(e) => Err(FeedPocketError::Server(format!(
                "content server task failed: {}",
                e
            ))),
        }
    }
}

async fn serve_content(
    State(documents): State<DocumentMap>,
    Path(file): Path<String>,
) -> Response {
    debug!(file = %file, "Received GET content request");

    let key = file.strip_suffix(".html").unwrap_or(&file);
    let document = documents
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(key)
        .cloned();

    let Some(document) = document else {
        return StatusCode::NOT_FOUND.into_response();
    };

    if document.gate.record_fetch() {
        info!(id = %document.item_id, "Content is served");
    } else {
        debug!(id = %document.item_id, hits = document.gate.fetch_count(), "Content served again");
    }

    Html(document.body.clone()).into_response()
}

/// Hex SHA-256 over the item id, the optional salt and a collision counter.
fn content_key(item_id: &str, salt: &str, seq: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(item_id.as_bytes());
    hasher.update(salt.as_bytes());
    if seq > 0 {
        hasher.update(format!("#{}", seq).as_bytes());
    }
    hex::encode(hasher.finalize())
}

fn random_salt() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SALT_LENGTH)
        .map(char::from)
        .collect()
}
