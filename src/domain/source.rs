use chrono::{DateTime, Utc};

/// One configured feed source, resolved for the current run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// Stable key; also the tag attached to every item and the snapshot directory name.
    pub id: String,
    pub name: String,
    pub url: String,
    /// Items whose effective time is before this instant are ignored.
    pub cutoff: DateTime<Utc>,
    /// Deliver a rendered copy through the content server instead of the original link.
    pub use_server: bool,
}

impl Source {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            url: url.into(),
            cutoff: DateTime::<Utc>::UNIX_EPOCH,
            use_server: false,
        }
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}
