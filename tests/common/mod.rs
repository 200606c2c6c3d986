//! Fakes shared by the end-to-end pipeline tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpListener;

use feedpocket::app::{FeedPocketError, Result};
use feedpocket::domain::NewItem;
use feedpocket::email::{Mailbox, RawMessage};
use feedpocket::fetcher::Fetcher;
use feedpocket::server::{ContentServer, ServerConfig};
use feedpocket::sink::{DeliveryError, DeliverySink};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// RSS 2.0 document with one `<item>` per `(guid, link)` pair, all published
/// in June 2024.
pub fn rss(items: &[(&str, &str)]) -> Vec<u8> {
    let mut body = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>Test feed</title><link>https://example.com/</link>"#,
    );
    for (n, (guid, link)) in items.iter().enumerate() {
        body.push_str(&format!(
            "<item><title>Post {n}</title><guid>{guid}</guid><link>{link}</link>\
             <description>&lt;p&gt;Body {n}&lt;/p&gt;</description>\
             <pubDate>Sat, 01 Jun 2024 {:02}:00:00 GMT</pubDate></item>",
            n % 24
        ));
    }
    body.push_str("</channel></rss>");
    body.into_bytes()
}

/// Serves canned documents keyed by URL. Unknown URLs fail like a 404.
#[derive(Default)]
pub struct FakeFetcher {
    documents: Mutex<HashMap<String, Vec<u8>>>,
    redirects: HashMap<String, String>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(self, url: &str, body: Vec<u8>) -> Self {
        self.set_document(url, body);
        self
    }

    pub fn with_redirect(mut self, from: &str, to: &str) -> Self {
        self.redirects.insert(from.to_string(), to.to_string());
        self
    }

    pub fn set_document(&self, url: &str, body: Vec<u8>) {
        self.documents
            .lock()
            .unwrap()
            .insert(url.to_string(), body);
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.documents
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| FeedPocketError::Other(format!("bad download status for {}", url)))
    }

    async fn resolve(&self, url: &str) -> Result<String> {
        Ok(self.redirects.get(url).cloned().unwrap_or_else(|| url.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkMode {
    Accept,
    Reject,
    /// GET every delivered URL before accepting, like the real service does.
    FetchUrls,
}

pub struct RecordingSink {
    mode: SinkMode,
    client: reqwest::Client,
    pub delivered: Mutex<Vec<NewItem>>,
}

impl RecordingSink {
    pub fn new(mode: SinkMode) -> Self {
        Self {
            mode,
            client: reqwest::Client::new(),
            delivered: Mutex::new(Vec::new()),
        }
    }

    pub fn delivered(&self) -> Vec<NewItem> {
        self.delivered.lock().unwrap().clone()
    }

    pub fn delivered_ids(&self) -> Vec<String> {
        self.delivered().into_iter().map(|item| item.id).collect()
    }
}

#[async_trait]
impl DeliverySink for RecordingSink {
    async fn deliver(&self, items: &[NewItem]) -> std::result::Result<(), DeliveryError> {
        match self.mode {
            SinkMode::Reject => {
                return Err(DeliveryError {
                    batch: 1,
                    accepted: 0,
                    source: FeedPocketError::Rejected("status 403".into()),
                })
            }
            SinkMode::FetchUrls => {
                for item in items {
                    let response = self.client.get(&item.url).send().await.unwrap();
                    assert!(response.status().is_success(), "{}", item.url);
                }
            }
            SinkMode::Accept => {}
        }
        self.delivered.lock().unwrap().extend_from_slice(items);
        Ok(())
    }
}

pub struct FakeMailbox {
    messages: Vec<RawMessage>,
    pub archived: Mutex<Vec<u32>>,
}

impl FakeMailbox {
    pub fn new(messages: Vec<RawMessage>) -> Self {
        Self {
            messages,
            archived: Mutex::new(Vec::new()),
        }
    }

    pub fn archived(&self) -> Vec<u32> {
        self.archived.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailbox for FakeMailbox {
    async fn fetch_messages(&self) -> Result<Vec<RawMessage>> {
        Ok(self.messages.clone())
    }

    async fn archive(&self, uids: &[u32]) -> Result<()> {
        self.archived.lock().unwrap().extend_from_slice(uids);
        Ok(())
    }
}

pub fn notification_email(uid: u32, link: &str) -> RawMessage {
    let raw = format!(
        "Message-ID: <{uid}@mail.example>\r\n\
         Subject: Shared item {uid}\r\n\
         Date: Sat, 01 Jun 2024 10:00:00 +0000\r\n\
         Content-Type: text/plain; charset=utf-8\r\n\
         \r\n\
         Something worth reading\r\n\
         via Twitter {link}\r\n"
    );
    RawMessage {
        uid,
        raw: raw.into_bytes(),
    }
}

/// Content server on an ephemeral local port, with the base URL pointing at it.
pub async fn local_server(random_url: bool) -> ContentServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let config = ServerConfig {
        listen: addr.to_string(),
        base_url: format!("http://{}/", addr),
        random_url,
        shutdown_timeout_secs: Some(5),
        pickup_timeout_secs: None,
    };
    ContentServer::from_listener(listener, &config).unwrap()
}

pub fn arc<T>(value: T) -> Arc<T> {
    Arc::new(value)
}
