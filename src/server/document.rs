use std::sync::Arc;

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::domain::NewItem;
use crate::server::gate::FetchGate;

/// A document held by the content server for the lifetime of the run.
#[derive(Debug)]
pub(crate) struct Document {
    pub(crate) item_id: String,
    pub(crate) key: String,
    pub(crate) url: String,
    pub(crate) body: String,
    pub(crate) gate: FetchGate,
}

/// Caller-side handle to a published document.
#[derive(Debug, Clone)]
pub struct PublishedDocument {
    inner: Arc<Document>,
}

impl PublishedDocument {
    pub(crate) fn new(inner: Arc<Document>) -> Self {
        Self { inner }
    }

    pub fn item_id(&self) -> &str {
        &self.inner.item_id
    }

    /// Path segment the document is served under, without the `.html` suffix.
    pub fn key(&self) -> &str {
        &self.inner.key
    }

    /// Fully-qualified URL under the configured base URL.
    pub fn url(&self) -> &str {
        &self.inner.url
    }

    pub fn is_fetched(&self) -> bool {
        self.inner.gate.is_fired()
    }

    pub fn fetch_count(&self) -> usize {
        self.inner.gate.fetch_count()
    }

    /// Resolves after the first successful GET of this document.
    pub async fn wait_fetched(&self) {
        self.inner.gate.wait().await
    }
}

/// Standalone HTML page for an item: escaped title, a link back to the
/// original, then the feed-provided body as-is.
pub fn render_document(item: &NewItem) -> String {
    let title = encode_text(item.display_title());
    let link = encode_double_quoted_attribute(&item.url);

    format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <title>{title}</title>\n\
         <link rel=\"canonical\" href=\"{link}\">\n\
         </head>\n\
         <body>\n\
         <article>\n\
         <h1>{title}</h1>\n\
         <p><a href=\"{link}\">{link}</a></p>\n\
         {body}\n\
         </article>\n\
         </body>\n\
         </html>\n",
        body = item.body,
    )
}
