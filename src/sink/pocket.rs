use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, info_span, Instrument};

use crate::app::{FeedPocketError, Result};
use crate::domain::NewItem;
use crate::sink::{DeliveryError, DeliverySink};

pub const DEFAULT_ENDPOINT: &str = "https://getpocket.com/v3/send";
pub const DEFAULT_BATCH: usize = 20;

/// `[pocket]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PocketConfig {
    pub consumer_key: String,
    pub access_token: String,
    /// Items per request; zero or negative means the default of 20.
    pub batch: i64,
    /// Override of the send endpoint.
    pub endpoint: Option<String>,
}

impl PocketConfig {
    pub fn batch_size(&self) -> usize {
        if self.batch <= 0 {
            DEFAULT_BATCH
        } else {
            self.batch as usize
        }
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    consumer_key: &'a str,
    access_token: &'a str,
    actions: Vec<AddAction<'a>>,
}

#[derive(Debug, Serialize)]
struct AddAction<'a> {
    action: &'static str,
    url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    time: Option<i64>,
    /// Comma-delimited, as the send API expects.
    #[serde(skip_serializing_if = "String::is_empty")]
    tags: String,
}

impl<'a> From<&'a NewItem> for AddAction<'a> {
    fn from(item: &'a NewItem) -> Self {
        Self {
            action: "add",
            url: &item.url,
            title: (!item.title.is_empty()).then_some(item.title.as_str()),
            time: item.time,
            tags: item.tags.join(","),
        }
    }
}

pub struct PocketClient {
    config: PocketConfig,
    client: Client,
}

impl PocketClient {
    pub fn new(config: PocketConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("feedpocket/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { config, client })
    }

    async fn send(&self, request: &SendRequest<'_>) -> Result<()> {
        let body = serde_json::to_vec(request)?;
        debug!(body = %String::from_utf8_lossy(&body), "Request body");

        let response = self
            .client
            .post(self.config.endpoint())
            .header(CONTENT_TYPE, "application/json; charset=UTF-8")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            error!(status = status.as_u16(), "Response status code");
            for (key, value) in response.headers() {
                error!("Response header[{}]: {:?}", key, value);
            }
            return Err(FeedPocketError::Rejected(format!(
                "api response failure: {}",
                status
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl DeliverySink for PocketClient {
    async fn deliver(&self, items: &[NewItem]) -> std::result::Result<(), DeliveryError> {
        if items.is_empty() {
            return Ok(());
        }

        let batch = self.config.batch_size();
        info!(count = items.len(), "Adding new items to Pocket");

        let mut accepted = 0;
        for (index, chunk) in items.chunks(batch).enumerate() {
            let request = SendRequest {
                consumer_key: &self.config.consumer_key,
                access_token: &self.config.access_token,
                actions: chunk.iter().map(AddAction::from).collect(),
            };

            let span = info_span!("batch", n = index + 1, items = chunk.len());
            self.send(&request)
                .instrument(span)
                .await
                .map_err(|source| DeliveryError {
                    batch: index + 1,
                    accepted,
                    source,
                })?;
            accepted += chunk.len();
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::Router;
    use serde_json::Value;

    use super::*;

    #[derive(Clone, Default)]
    struct Recorder {
        requests: Arc<Mutex<Vec<Value>>>,
        reject_from: Option<usize>,
    }

    async fn record(State(recorder): State<Recorder>, body: String) -> StatusCode {
        let mut requests = recorder.requests.lock().unwrap();
        requests.push(serde_json::from_str(&body).unwrap());
        match recorder.reject_from {
            Some(n) if requests.len() >= n => StatusCode::FORBIDDEN,
            _ => StatusCode::OK,
        }
    }

    async fn spawn_api(recorder: Recorder) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = Router::new()
            .route("/v3/send", post(record))
            .with_state(recorder);
        tokio::spawn(async move { axum::serve(listener, router).await });
        format!("http://{}/v3/send", addr)
    }

    fn items(n: usize) -> Vec<NewItem> {
        (0..n)
            .map(|i| NewItem {
                id: format!("g{}", i),
                url: format!("https://example.com/{}", i),
                title: format!("Item {}", i),
                time: Some(1_700_000_000 + i as i64),
                tags: vec!["blog".into()],
                body: String::new(),
            })
            .collect()
    }

    fn client(endpoint: String, batch: i64) -> PocketClient {
        PocketClient::new(PocketConfig {
            consumer_key: "ck".into(),
            access_token: "at".into(),
            batch,
            endpoint: Some(endpoint),
        })
        .unwrap()
    }

    #[test]
    fn test_batch_size_defaults() {
        let mut config = PocketConfig::default();
        assert_eq!(config.batch_size(), 20);
        config.batch = -3;
        assert_eq!(config.batch_size(), 20);
        config.batch = 5;
        assert_eq!(config.batch_size(), 5);
        assert_eq!(config.endpoint(), DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_add_action_shape() {
        let mut item = items(1).remove(0);
        let json = serde_json::to_value(AddAction::from(&item)).unwrap();
        assert_eq!(json["action"], "add");
        assert_eq!(json["url"], "https://example.com/0");
        assert_eq!(json["title"], "Item 0");
        assert_eq!(json["time"], 1_700_000_000);
        assert_eq!(json["tags"], "blog");

        item.title.clear();
        item.time = None;
        item.tags.clear();
        let json = serde_json::to_value(AddAction::from(&item)).unwrap();
        assert!(json.get("title").is_none());
        assert!(json.get("time").is_none());
        assert!(json.get("tags").is_none());
    }

    #[tokio::test]
    async fn test_deliver_splits_into_batches_in_order() {
        let recorder = Recorder::default();
        let endpoint = spawn_api(recorder.clone()).await;

        client(endpoint, 2).deliver(&items(5)).await.unwrap();

        let requests = recorder.requests.lock().unwrap();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0]["consumer_key"], "ck");
        assert_eq!(requests[0]["access_token"], "at");
        let urls: Vec<_> = requests
            .iter()
            .flat_map(|r| r["actions"].as_array().unwrap().clone())
            .map(|a| a["url"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(urls, (0..5).map(|i| format!("https://example.com/{}", i)).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_deliver_stops_at_rejected_batch() {
        let recorder = Recorder {
            reject_from: Some(2),
            ..Default::default()
        };
        let endpoint = spawn_api(recorder.clone()).await;

        let err = client(endpoint, 2).deliver(&items(5)).await.unwrap_err();

        assert_eq!(err.batch, 2);
        assert_eq!(err.accepted, 2);
        assert!(matches!(err.source, FeedPocketError::Rejected(_)));
        assert_eq!(recorder.requests.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_deliver_nothing_sends_nothing() {
        let recorder = Recorder::default();
        let endpoint = spawn_api(recorder.clone()).await;

        client(endpoint, 0).deliver(&[]).await.unwrap();
        assert!(recorder.requests.lock().unwrap().is_empty());
    }
}
