use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::app::{FeedPocketError, Result};

/// `[main.http_server]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. `0.0.0.0:8080`.
    pub listen: String,

    /// Externally reachable URL that maps onto this server's root.
    pub base_url: String,

    /// Salt content keys with a random suffix so URLs cannot be guessed.
    pub random_url: bool,

    /// Upper bound for graceful shutdown (default: wait indefinitely)
    pub shutdown_timeout_secs: Option<u64>,

    /// Upper bound for waiting on the first fetch of a batch (default: wait indefinitely)
    pub pickup_timeout_secs: Option<u64>,
}

impl ServerConfig {
    pub fn is_configured(&self) -> bool {
        !self.listen.trim().is_empty()
    }

    pub fn shutdown_timeout(&self) -> Option<Duration> {
        self.shutdown_timeout_secs.map(Duration::from_secs)
    }

    pub fn pickup_timeout(&self) -> Option<Duration> {
        self.pickup_timeout_secs.map(Duration::from_secs)
    }

    /// Parse `base_url`; it must be able to carry path segments.
    pub fn parsed_base_url(&self) -> Result<Url> {
        let url = Url::parse(self.base_url.trim()).map_err(|e| {
            FeedPocketError::Config(format!("http_server.base_url is not valid: {}", e))
        })?;
        if url.cannot_be_a_base() {
            return Err(FeedPocketError::Config(format!(
                "http_server.base_url cannot carry a path: {}",
                url
            )));
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_no_timeouts() {
        let config = ServerConfig::default();
        assert!(!config.is_configured());
        assert!(!config.random_url);
        assert_eq!(config.shutdown_timeout(), None);
        assert_eq!(config.pickup_timeout(), None);
    }

    #[test]
    fn test_timeouts() {
        let config = ServerConfig {
            shutdown_timeout_secs: Some(5),
            pickup_timeout_secs: Some(600),
            ..Default::default()
        };
        assert_eq!(config.shutdown_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.pickup_timeout(), Some(Duration::from_secs(600)));
    }

    #[test]
    fn test_parsed_base_url() {
        let config = ServerConfig {
            base_url: "https://example.org/pocket/".into(),
            ..Default::default()
        };
        assert_eq!(
            config.parsed_base_url().unwrap().as_str(),
            "https://example.org/pocket/"
        );
    }

    #[test]
    fn test_malformed_base_url_is_config_error() {
        for bad in ["not a url", "", "mailto:someone@example.org"] {
            let config = ServerConfig {
                base_url: bad.into(),
                ..Default::default()
            };
            assert!(
                matches!(config.parsed_base_url(), Err(FeedPocketError::Config(_))),
                "{bad} should be rejected"
            );
        }
    }
}
