//! Configuration file model.
//!
//! The file is given on the command line. Sections:
//!
//! - `[main]`: data directory and the `[main.http_server]` content server
//! - `[pocket]`: bookmarking API credentials and batching
//! - `[rss]`: global cutoff and the `[rss.sources.<id>]` table
//! - `[email]`: optional notification mailbox

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

use crate::domain::Source;
use crate::email::EmailConfig;
use crate::server::ServerConfig;
use crate::sink::PocketConfig;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub main: MainConfig,
    pub pocket: PocketConfig,
    pub rss: RssConfig,
    pub email: EmailConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MainConfig {
    /// Where snapshots live (default: `<platform data dir>/feedpocket`)
    pub data_dir: Option<PathBuf>,
    pub http_server: ServerConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RssConfig {
    /// Global cutoff; sources without their own `start_date` use this one.
    #[serde(deserialize_with = "deserialize_date")]
    pub start_date: Option<DateTime<Utc>>,
    pub sources: BTreeMap<String, SourceConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub name: String,
    pub url: String,
    #[serde(deserialize_with = "deserialize_date")]
    pub start_date: Option<DateTime<Utc>>,
    /// Deliver through the content server instead of linking directly.
    pub use_server: bool,
}

impl Config {
    /// Read, parse and validate the file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (id, source) in &self.rss.sources {
            if id.is_empty() || id.contains(['/', '\\']) || id == "." || id == ".." {
                return Err(ConfigError::Invalid(format!(
                    "rss source id {:?} cannot be used as a directory name",
                    id
                )));
            }
            url::Url::parse(source.url.trim()).map_err(|e| {
                ConfigError::Invalid(format!("rss.sources.{}.url is not valid: {}", id, e))
            })?;
        }

        if self.requires_server() {
            if !self.main.http_server.is_configured() {
                return Err(ConfigError::Invalid(
                    "main.http_server.listen is required by sources with use_server".into(),
                ));
            }
            self.main
                .http_server
                .parsed_base_url()
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }

        Ok(())
    }

    /// Sources in identifier order, with the global cutoff filled in.
    pub fn sources(&self) -> Vec<Source> {
        let global = self.rss.start_date.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        self.rss
            .sources
            .iter()
            .map(|(id, source)| Source {
                id: id.clone(),
                name: source.name.clone(),
                url: source.url.trim().to_string(),
                cutoff: source.start_date.unwrap_or(global),
                use_server: source.use_server,
            })
            .collect()
    }

    /// Whether any source needs the content server.
    pub fn requires_server(&self) -> bool {
        self.rss.sources.values().any(|s| s.use_server)
    }

    /// Absolute data directory.
    pub fn data_dir(&self) -> Result<PathBuf, ConfigError> {
        let dir = match &self.main.data_dir {
            Some(dir) => dir.clone(),
            None => dirs::data_dir()
                .ok_or(ConfigError::NoDataDir)?
                .join("feedpocket"),
        };
        std::path::absolute(&dir).map_err(|e| ConfigError::Io {
            path: dir,
            source: e,
        })
    }
}

/// Accepts TOML datetimes/dates as well as strings in RFC 3339,
/// `YYYY-MM-DDTHH:MM:SS` (UTC) or `YYYY-MM-DD` (midnight UTC).
fn deserialize_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<toml::Value>::deserialize(deserializer)? {
        None => Ok(None),
        Some(toml::Value::Datetime(dt)) => parse_date(&dt.to_string()).map(Some).map_err(D::Error::custom),
        Some(toml::Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(toml::Value::String(s)) => parse_date(&s).map(Some).map_err(D::Error::custom),
        Some(other) => Err(D::Error::custom(format!(
            "expected a date, found {}",
            other.type_str()
        ))),
    }
}

pub fn parse_date(s: &str) -> Result<DateTime<Utc>, String> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(dt.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| format!("invalid date: {}", s))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine data directory")]
    NoDataDir,

    #[error("Failed to read config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
