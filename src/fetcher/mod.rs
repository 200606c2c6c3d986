pub mod http_fetcher;

use async_trait::async_trait;

use crate::app::Result;

pub use http_fetcher::HttpFetcher;

#[async_trait]
pub trait Fetcher {
    /// Download the raw document at `url`. Non-success statuses are errors.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;

    /// Follow the redirect chain starting at `url` and return the final location.
    async fn resolve(&self, url: &str) -> Result<String>;
}
