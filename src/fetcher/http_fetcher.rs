use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::app::{FeedPocketError, Result};
use crate::fetcher::Fetcher;

const USER_AGENT: &str = concat!("feedpocket/", env!("CARGO_PKG_VERSION"));
const MAX_REDIRECTS: usize = 10;

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .gzip(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedPocketError::Other(format!(
                "bad download status: {}",
                status
            )));
        }

        let body = response.bytes().await?.to_vec();
        tracing::debug!(url, bytes = body.len(), "Downloaded feed");
        Ok(body)
    }

    async fn resolve(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        Ok(response.url().to_string())
    }
}
