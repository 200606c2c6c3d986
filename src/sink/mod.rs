pub mod pocket;

use async_trait::async_trait;
use thiserror::Error;

use crate::app::FeedPocketError;
use crate::domain::NewItem;

pub use pocket::{PocketClient, PocketConfig};

/// A delivery that stopped part-way. Batches before `batch` were accepted and
/// are not resubmitted; everything from `batch` on was not delivered.
#[derive(Error, Debug)]
#[error("batch {batch} failed after {accepted} accepted items: {source}")]
pub struct DeliveryError {
    /// 1-based index of the rejected batch.
    pub batch: usize,
    pub accepted: usize,
    #[source]
    pub source: FeedPocketError,
}

#[async_trait]
pub trait DeliverySink {
    /// Submit `items` in order. Stops at the first rejected batch.
    async fn deliver(&self, items: &[NewItem]) -> Result<(), DeliveryError>;
}
